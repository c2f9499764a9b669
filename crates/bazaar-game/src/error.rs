//! Error types for the game layer.

use bazaar_protocol::{ProtocolError, UserId};

/// Errors that can occur while delivering messages or talking to a game
/// actor.
///
/// Game rules never produce errors: a message that doesn't fit the current
/// phase is ignored, and an unknown commodity is simply worth nothing.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The user's outbound channel is gone.
    #[error("user {0} is disconnected")]
    Disconnected(UserId),

    /// The user is already attached to this game.
    #[error("user {0} already in game {1}")]
    AlreadyConnected(UserId, String),

    /// No game with this name.
    #[error("game {0} not found")]
    NotFound(String),

    /// A message could not be encoded for delivery.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The game's command channel is full or closed.
    #[error("game {0} is unavailable")]
    Unavailable(String),
}
