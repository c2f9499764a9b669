//! The two collaborators a [`Game`](crate::Game) talks to.
//!
//! The game never touches sockets. Whoever hosts it (the session actor in
//! production, recording fakes in tests) hands it a [`GameConnection`] for
//! broadcasts and a [`User`] for every inbound message.

use bazaar_protocol::{Message, UserId};

use crate::GameError;

/// One participant, as seen by the game while handling their message.
///
/// The game only borrows a `User` for the duration of one call. Anything it
/// needs to remember (readiness, the name on a bid) is copied out.
pub trait User {
    /// Stable identity assigned by the transport.
    fn id(&self) -> UserId;

    /// Current display name. May be empty and need not be unique.
    fn name(&self) -> &str;

    /// Renames the user.
    fn set_name(&mut self, name: String);

    /// Delivers a message to this user only.
    ///
    /// # Errors
    /// Returns [`GameError::Disconnected`] if the user can no longer be
    /// reached. The game logs and carries on.
    fn message(&mut self, message: &Message) -> Result<(), GameError>;
}

/// Fan-out to everyone in the session.
pub trait GameConnection {
    /// Sends a message to every connected user, preserving call order.
    ///
    /// # Errors
    /// Reports the first delivery failure. Users that could be reached
    /// still receive the message.
    fn broadcast(&mut self, message: &Message) -> Result<(), GameError>;
}
