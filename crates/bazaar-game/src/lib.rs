//! Session logic for Bazaar.
//!
//! A session cycles through three phases (lobby, auction, trading) around
//! a shared commodity market. Each session runs as an isolated Tokio task
//! (actor model) with its own phase, clock, and market.
//!
//! # Key types
//!
//! - [`Game`]: the synchronous session core; drive it by hand in tests
//! - [`Phase`]: the active phase and its local state
//! - [`User`] / [`GameConnection`]: how a game reaches players
//! - [`GameHandle`]: send commands to a running session actor
//! - [`GameManager`]: creates/destroys named sessions
//! - [`GameConfig`]: session rules (player minimum, timers, lots, seed)

mod actor;
mod config;
mod error;
mod game;
mod manager;
mod phase;
mod user;

pub use actor::{GameHandle, GameInfo, UserSender, spawn_game};
pub use config::{DEFAULT_AUCTION_BID_TIME, DEFAULT_TRADING_STAGE_TIME, GameConfig};
pub use error::GameError;
pub use game::Game;
pub use manager::GameManager;
pub use phase::{Auction, LeadingBid, Phase, Trade, Waiting};
pub use user::{GameConnection, User};
