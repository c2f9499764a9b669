//! Unified error type for the Bazaar server.

use bazaar_game::GameError;
use bazaar_protocol::ProtocolError;
use tokio_tungstenite::tungstenite;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum BazaarError {
    /// Binding or accepting a socket failed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The WebSocket handshake or a frame failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// A client connected but never finished the upgrade request.
    #[error("websocket handshake with {0} timed out")]
    HandshakeTimeout(std::net::SocketAddr),

    /// A protocol-level error (encode, decode, unknown action).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-level error (unavailable, already connected).
    #[error(transparent)]
    Game(#[from] GameError),
}
