//! Wire protocol for Bazaar.
//!
//! This crate defines the "language" that clients and the game server speak:
//!
//! - **Types** ([`UserId`], [`CommodityType`], [`PhaseName`], [`PlayerInfo`]):
//!   identity and value types shared by every other crate.
//! - **Messages** ([`Message`], [`Action`]): the closed set of actions that
//!   travel on the wire, each a flat JSON object tagged by `"action"`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages are converted
//!   to/from bytes, including the two-pass [`decode_message`].
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the socket (raw frames) and the game
//! (phases, market). It doesn't know about connections or sessions;
//! it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Socket (frames) → Protocol (Message) → Game (phase state machine)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::{decode_message, Codec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{Action, Message};
pub use types::{CommodityType, PhaseName, PlayerInfo, UserId};
