//! # Bazaar
//!
//! Authoritative server for a multiplayer trading and auction party game.
//!
//! Players gather in a named game, mark themselves ready, bid on commodity
//! lots in timed auction rounds, then sell into a shared market whose
//! prices fall as supply grows. Every game runs as its own actor; this
//! crate puts them behind a WebSocket listener.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bazaar::prelude::*;
//!
//! # async fn run() -> Result<(), BazaarError> {
//! let server = BazaarServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .game_config(GameConfig { min_players: 3, ..GameConfig::default() })
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! Clients connect to `ws://host:port/<game>` and exchange JSON messages
//! tagged by `"action"`, e.g. `{"action":"ready","ready":true}`.

mod error;
mod handler;
mod server;
mod transport;

pub use error::BazaarError;
pub use server::{BazaarServer, BazaarServerBuilder};
pub use transport::{DEFAULT_GAME, WebSocketListener, game_name};

/// Common imports for running a server.
pub mod prelude {
    pub use crate::{BazaarError, BazaarServer, BazaarServerBuilder};
    pub use bazaar_clock::{TickPolicy, TickerConfig};
    pub use bazaar_game::GameConfig;
    pub use bazaar_protocol::{Message, PhaseName};
}
