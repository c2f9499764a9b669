//! Game configuration.

use std::collections::VecDeque;
use std::time::Duration;

use bazaar_market::{Market, MarketConfig};
use bazaar_protocol::CommodityType;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How long each auction round stays open by default.
pub const DEFAULT_AUCTION_BID_TIME: Duration = Duration::from_secs(10);

/// How long the trading stage lasts by default.
pub const DEFAULT_TRADING_STAGE_TIME: Duration = Duration::from_secs(60);

/// Rules for one game session.
///
/// Every field has a default, so callers usually start from
/// `GameConfig::default()` and override what they need:
///
/// ```rust
/// use bazaar_game::GameConfig;
///
/// let config = GameConfig {
///     min_players: 3,
///     seed: Some(7),
///     ..GameConfig::default()
/// };
/// assert_eq!(config.currency.as_ref().map(|c| c.as_str()), Some("purple"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Players that must be known and ready before the auction starts.
    pub min_players: usize,

    /// How long each auction round accepts bids.
    pub auction_bid_time: Duration,

    /// How long the trading stage lasts before returning to the lobby.
    pub trading_stage_time: Duration,

    /// Seed for the session's random generator. `None` = OS entropy.
    pub seed: Option<u64>,

    /// Commodities to auction, in order. `None` = every market commodity
    /// except [`currency`](Self::currency).
    pub auction_lots: Option<Vec<CommodityType>>,

    /// The commodity used to pay for lots. Never auctioned by default.
    pub currency: Option<CommodityType>,

    /// Initial market listing.
    pub market: MarketConfig,

    /// Honour client `tick` messages. Development only: lets a client move
    /// the session clock.
    pub debug_ticks: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            auction_bid_time: DEFAULT_AUCTION_BID_TIME,
            trading_stage_time: DEFAULT_TRADING_STAGE_TIME,
            seed: None,
            auction_lots: None,
            currency: Some(CommodityType::new("purple")),
            market: MarketConfig::default(),
            debug_ticks: false,
        }
    }
}

impl GameConfig {
    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`Game::new`](crate::Game::new). A
    /// `min_players` of zero would start an auction for an empty lobby, so
    /// it is raised to one.
    pub fn validated(mut self) -> Self {
        if self.min_players == 0 {
            warn!("min_players is 0, raising to 1");
            self.min_players = 1;
        }
        self
    }

    /// The lots one auction stage will offer, in order.
    pub fn lots(&self, market: &Market) -> VecDeque<CommodityType> {
        match &self.auction_lots {
            Some(lots) => lots.iter().cloned().collect(),
            None => market
                .commodities()
                .iter()
                .filter(|c| Some(*c) != self.currency.as_ref())
                .cloned()
                .collect(),
        }
    }
}
