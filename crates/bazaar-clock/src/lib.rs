//! Session time for Bazaar.
//!
//! Two pieces, one on each side of the session actor:
//!
//! - [`GameClock`] lives inside a game. It knows the authoritative elapsed
//!   session time and holds at most one pending timeout. It never looks at
//!   a real clock: time only moves when someone calls
//!   [`GameClock::advance`].
//! - [`Ticker`] lives in the actor loop. It turns wall-clock time into a
//!   steady stream of elapsed-time values that the actor feeds to the game.
//!
//! Keeping them apart is what makes games replayable in tests: drive the
//! `GameClock` by hand and every timeout fires at exactly the same point.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         info = ticker.wait_for_tick() => game.tick(info.elapsed),
//!     }
//! }
//! ```

mod clock;
mod ticker;

pub use clock::GameClock;
pub use ticker::{TickInfo, TickPolicy, Ticker, TickerConfig};
