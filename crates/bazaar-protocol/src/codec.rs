//! Codec trait, the JSON implementation, and the two-pass message decoder.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The rest of Bazaar only needs something that implements [`Codec`];
//! today that is [`JsonCodec`], because browser clients speak JSON.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{Action, Message, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → one codec is shared by every connection task.
/// - `'static` → the codec owns everything it needs.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the frame buffer can be dropped right
/// after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// Two-pass decoding
// ---------------------------------------------------------------------------

/// Only the tag of a message. Every other field is ignored.
#[derive(Deserialize)]
struct ActionTag {
    #[serde(default)]
    action: Option<String>,
}

/// Decodes one inbound frame into a [`Message`].
///
/// Decoding runs in two passes so each failure gets its own error:
///
/// 1. Read only the `action` tag. A payload that is not an object, or whose
///    tag is not a string, is a [`ProtocolError::Decode`]; an object with no
///    tag is [`ProtocolError::MissingAction`].
/// 2. Check the tag against the catalog ([`ProtocolError::UnknownAction`]),
///    then decode the full shape for that tag.
///
/// ```rust
/// use bazaar_protocol::{decode_message, JsonCodec, Message};
///
/// let msg = decode_message(&JsonCodec, br#"{"action":"bid","amount":10}"#).unwrap();
/// assert_eq!(msg, Message::Bid { amount: 10 });
/// ```
pub fn decode_message<C: Codec>(codec: &C, data: &[u8]) -> Result<Message, ProtocolError> {
    let tag: ActionTag = codec.decode(data)?;
    let tag = tag.action.ok_or(ProtocolError::MissingAction)?;
    if Action::from_tag(&tag).is_none() {
        return Err(ProtocolError::UnknownAction(tag));
    }
    codec.decode(data)
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use bazaar_protocol::{Codec, JsonCodec, Message, PhaseName};
///
/// let codec = JsonCodec;
/// let msg = Message::GameStateChanged { new_state: PhaseName::Trade };
///
/// let bytes = codec.encode(&msg).unwrap();
/// assert_eq!(bytes, br#"{"action":"game_state_changed","new_state":"trade"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
