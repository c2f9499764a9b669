//! Error types for the protocol layer.
//!
//! Each crate in Bazaar defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or in the
//! shape of an inbound message, not in game rules or networking.

/// Errors that can occur in the protocol layer.
///
/// These are the only errors a client can provoke with a malformed frame.
/// They are reported to whoever called the decoder; the game itself never
/// sees a message that failed here.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields for the
    /// declared action, or wrong data types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload is a JSON object but has no string `action` field.
    #[error("message has no action tag")]
    MissingAction,

    /// The `action` tag is not part of the catalog.
    #[error("unknown action: {0:?}")]
    UnknownAction(String),
}
