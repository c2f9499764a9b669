//! Identity and value types shared across Bazaar.
//!
//! Everything here travels on the wire at some point, so each type derives
//! `Serialize`/`Deserialize` and the tests below pin down its JSON shape.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for one connected user.
///
/// Assigned by the transport when a connection is accepted. Display names
/// are mutable and need not be unique, so the game keys everything it
/// remembers about a user (readiness, for example) by this id instead.
///
/// `#[serde(transparent)]` makes `UserId(42)` serialize as plain `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The name of a commodity traded in the market (e.g. `"tomato"`).
///
/// A newtype over `String` rather than a Rust enum: the commodity set is
/// fixed per market configuration, not at compile time, and a client may
/// name a commodity the market has never heard of. The market answers such
/// requests with a zero price instead of failing to decode them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommodityType(pub String);

impl CommodityType {
    /// Creates a commodity type from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the commodity name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommodityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommodityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

// ---------------------------------------------------------------------------
// PhaseName
// ---------------------------------------------------------------------------

/// The lifecycle phase a game session is in.
///
/// Phases cycle strictly, with no skipping:
///
/// ```text
/// Waiting → Auction → Trade → Waiting → …
/// ```
///
/// - **Waiting**: players gather and mark themselves ready.
/// - **Auction**: one bidding round per auctioned commodity.
/// - **Trade**: players sell goods into the market until the clock runs out.
///
/// Serialized in lowercase (`"waiting"`, `"auction"`, `"trade"`), which is
/// what `game_state_changed` and `welcome` carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseName {
    Waiting,
    Auction,
    Trade,
}

impl PhaseName {
    /// The phase that follows this one in the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Auction,
            Self::Auction => Self::Trade,
            Self::Trade => Self::Waiting,
        }
    }

    /// Returns the wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Auction => "auction",
            Self::Trade => "trade",
        }
    }
}

impl fmt::Display for PhaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PlayerInfo
// ---------------------------------------------------------------------------

/// One row of the roster snapshot broadcast in `player_info_updated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// The player's display name at the time of the snapshot.
    pub name: String,
    /// Whether the player has marked themselves ready.
    pub ready: bool,
}
