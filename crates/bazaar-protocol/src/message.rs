//! The action catalog: every message a client or the server can send.
//!
//! Each message is a flat JSON object with a string `action` tag plus the
//! fields for that action:
//!
//! ```json
//! { "action": "bid", "amount": 10 }
//! { "action": "set_clock", "time": 10000 }
//! ```
//!
//! [`Message`] is a closed enum over the whole catalog. Server→client and
//! client→server actions share one type, the same way they share one tag
//! namespace on the wire.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CommodityType, PhaseName, PlayerInfo};

// ---------------------------------------------------------------------------
// Action: the tag alone
// ---------------------------------------------------------------------------

/// The `action` tag of a message, without its payload.
///
/// Used by the first decoding pass to reject unknown tags before looking at
/// the rest of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // -- Server broadcasts --
    GameStateChanged,
    AuctionSeed,
    Welcome,
    BidUpdated,
    SetClock,
    EffectActivated,
    PlayerInfoUpdated,
    PriceUpdated,

    // -- Server → single client --
    AuctionWon,
    TradeCompleted,
    SaleCompleted,

    // -- Client → server --
    Bid,
    Ready,
    Join,
    Leave,
    Trade,
    Sell,
    SetName,
    ActivateEffect,

    // -- Debug only --
    Tick,
}

impl Action {
    /// Every action in the catalog.
    pub const ALL: [Action; 20] = [
        Action::GameStateChanged,
        Action::AuctionSeed,
        Action::Welcome,
        Action::BidUpdated,
        Action::SetClock,
        Action::EffectActivated,
        Action::PlayerInfoUpdated,
        Action::PriceUpdated,
        Action::AuctionWon,
        Action::TradeCompleted,
        Action::SaleCompleted,
        Action::Bid,
        Action::Ready,
        Action::Join,
        Action::Leave,
        Action::Trade,
        Action::Sell,
        Action::SetName,
        Action::ActivateEffect,
        Action::Tick,
    ];

    /// The wire tag for this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GameStateChanged => "game_state_changed",
            Self::AuctionSeed => "auction_seed",
            Self::Welcome => "welcome",
            Self::BidUpdated => "bid_updated",
            Self::SetClock => "set_clock",
            Self::EffectActivated => "effect_activated",
            Self::PlayerInfoUpdated => "player_info_updated",
            Self::PriceUpdated => "price_updated",
            Self::AuctionWon => "auction_won",
            Self::TradeCompleted => "trade_completed",
            Self::SaleCompleted => "sale_completed",
            Self::Bid => "bid",
            Self::Ready => "ready",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Trade => "trade",
            Self::Sell => "sell",
            Self::SetName => "set_name",
            Self::ActivateEffect => "activate_effect",
            Self::Tick => "tick",
        }
    }

    /// Looks up an action by its wire tag. Returns `None` for unknown tags.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == tag)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message: tag plus payload
// ---------------------------------------------------------------------------

/// A complete message, inbound or outbound.
///
/// `#[serde(tag = "action", rename_all = "snake_case")]` produces internally
/// tagged JSON: `Message::Bid { amount: 10 }` becomes
/// `{"action":"bid","amount":10}`, and unit variants such as
/// `Message::Join` become `{"action":"join"}`. The tag is always written
/// first, so encoding the same message twice yields identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Message {
    // -- Server broadcasts --
    /// The session moved to a new phase.
    GameStateChanged { new_state: PhaseName },

    /// The seed clients use to lay out the round that just opened.
    AuctionSeed { seed: u32 },

    /// Reply to `join`: the session name and its current phase.
    Welcome { game: String, state: PhaseName },

    /// A bidding round closed with a leading bid.
    BidUpdated { bid: i64, winner: String },

    /// How long the current phase or round lasts, in milliseconds.
    SetClock { time: u64 },

    /// Echo of an `activate_effect`, naming who triggered it.
    EffectActivated { id: i64, author: String },

    /// Roster snapshot in join order.
    PlayerInfoUpdated { info: Vec<PlayerInfo> },

    /// The unit price of a commodity changed after a sale.
    PriceUpdated {
        #[serde(rename = "type")]
        commodity: CommodityType,
        price: f64,
    },

    // -- Server → single client --
    /// Reserved for a future per-winner notice. The server never sends it;
    /// round winners are announced to everyone through `bid_updated`.
    AuctionWon,

    TradeCompleted { materials: String },

    /// Confirms a `sell`: the per-unit price the whole lot cleared at.
    SaleCompleted {
        #[serde(rename = "type")]
        commodity: CommodityType,
        quantity: u64,
        price: f64,
    },

    // -- Client → server --
    /// Place or replace a bid in the open auction round.
    Bid { amount: i64 },

    /// Set the sender's readiness flag.
    Ready { ready: bool },

    Join,

    Leave,

    Trade { materials: String },

    /// Sell `quantity` units of a commodity into the market.
    Sell {
        #[serde(rename = "type")]
        commodity: CommodityType,
        quantity: u64,
    },

    SetName { name: String },

    /// Trigger a client-side effect. `timeout` is optional on the wire.
    ActivateEffect {
        id: i64,
        #[serde(default)]
        timeout: i64,
    },

    // -- Debug only --
    /// Advance the session clock to `tick_ms` milliseconds.
    Tick { tick_ms: f64 },
}

impl Message {
    /// The tag this message is sent under.
    pub fn action(&self) -> Action {
        match self {
            Self::GameStateChanged { .. } => Action::GameStateChanged,
            Self::AuctionSeed { .. } => Action::AuctionSeed,
            Self::Welcome { .. } => Action::Welcome,
            Self::BidUpdated { .. } => Action::BidUpdated,
            Self::SetClock { .. } => Action::SetClock,
            Self::EffectActivated { .. } => Action::EffectActivated,
            Self::PlayerInfoUpdated { .. } => Action::PlayerInfoUpdated,
            Self::PriceUpdated { .. } => Action::PriceUpdated,
            Self::AuctionWon => Action::AuctionWon,
            Self::TradeCompleted { .. } => Action::TradeCompleted,
            Self::SaleCompleted { .. } => Action::SaleCompleted,
            Self::Bid { .. } => Action::Bid,
            Self::Ready { .. } => Action::Ready,
            Self::Join => Action::Join,
            Self::Leave => Action::Leave,
            Self::Trade { .. } => Action::Trade,
            Self::Sell { .. } => Action::Sell,
            Self::SetName { .. } => Action::SetName,
            Self::ActivateEffect { .. } => Action::ActivateEffect,
            Self::Tick { .. } => Action::Tick,
        }
    }

    /// Builds a `set_clock` message, truncating to whole milliseconds.
    pub fn set_clock(duration: Duration) -> Self {
        Self::SetClock {
            time: duration.as_millis() as u64,
        }
    }

    /// Builds a debug `tick` message for the given elapsed time.
    pub fn tick(elapsed: Duration) -> Self {
        Self::Tick {
            tick_ms: elapsed.as_millis() as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_json(msg: &Message) -> String {
        serde_json::to_string(msg).unwrap()
    }

    #[test]
    fn test_every_action_tag_round_trips_through_from_tag() {
        for action in Action::ALL {
            assert_eq!(Action::from_tag(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_tag("fly_to_moon"), None);
    }

    #[test]
    fn test_tag_is_written_first() {
        let json = to_json(&Message::BidUpdated {
            bid: 10,
            winner: "tester".into(),
        });
        assert_eq!(json, r#"{"action":"bid_updated","bid":10,"winner":"tester"}"#);
    }

    #[test]
    fn test_unit_variant_is_a_bare_tag() {
        assert_eq!(to_json(&Message::Join), r#"{"action":"join"}"#);
        assert_eq!(to_json(&Message::AuctionWon), r#"{"action":"auction_won"}"#);
    }

    #[test]
    fn test_game_state_changed_json_format() {
        let json = to_json(&Message::GameStateChanged {
            new_state: PhaseName::Auction,
        });
        assert_eq!(json, r#"{"action":"game_state_changed","new_state":"auction"}"#);
    }

    #[test]
    fn test_welcome_json_format() {
        let json = to_json(&Message::Welcome {
            game: "g".into(),
            state: PhaseName::Waiting,
        });
        assert_eq!(json, r#"{"action":"welcome","game":"g","state":"waiting"}"#);
    }

    #[test]
    fn test_set_clock_is_in_milliseconds() {
        let msg = Message::set_clock(Duration::from_secs(10));
        assert_eq!(to_json(&msg), r#"{"action":"set_clock","time":10000}"#);
    }

    #[test]
    fn test_sell_uses_type_field_for_commodity() {
        let msg = Message::Sell {
            commodity: "corn".into(),
            quantity: 3,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "sell");
        assert_eq!(json["type"], "corn");
        assert_eq!(json["quantity"], 3);
    }

    #[test]
    fn test_player_info_updated_json_format() {
        let msg = Message::PlayerInfoUpdated {
            info: vec![PlayerInfo {
                name: "George".into(),
                ready: true,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "player_info_updated");
        assert_eq!(json["info"][0]["name"], "George");
        assert_eq!(json["info"][0]["ready"], true);
    }

    #[test]
    fn test_activate_effect_timeout_is_optional() {
        let msg: Message =
            serde_json::from_str(r#"{"action":"activate_effect","id":2}"#).unwrap();
        assert_eq!(msg, Message::ActivateEffect { id: 2, timeout: 0 });
    }

    #[test]
    fn test_action_matches_serialized_tag() {
        let samples = [
            Message::AuctionSeed { seed: 1 },
            Message::Ready { ready: true },
            Message::Leave,
            Message::tick(Duration::from_millis(250)),
            Message::TradeCompleted {
                materials: "wood".into(),
            },
        ];
        for msg in samples {
            let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["action"], msg.action().as_str());
        }
    }
}
