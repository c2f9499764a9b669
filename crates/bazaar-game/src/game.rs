//! The `Game` façade: one session's phase, clock, and market.

use std::collections::HashMap;
use std::time::Duration;

use bazaar_clock::GameClock;
use bazaar_market::Market;
use bazaar_protocol::{CommodityType, Message, PhaseName};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::phase::{Phase, Transition};
use crate::{GameConfig, GameConnection, User};

/// Everything a phase hook may touch, split off from [`Game`] so the
/// active phase can be borrowed mutably alongside it.
#[derive(Debug)]
pub(crate) struct GameContext<C> {
    pub(crate) name: String,
    pub(crate) connection: C,
    pub(crate) clock: GameClock,
    pub(crate) market: Market,
    pub(crate) rng: StdRng,
    pub(crate) config: GameConfig,
}

impl<C: GameConnection> GameContext<C> {
    /// Broadcasts to the session. Delivery failures are logged, not raised.
    pub(crate) fn broadcast(&mut self, message: &Message) {
        if let Err(e) = self.connection.broadcast(message) {
            warn!(game = %self.name, action = %message.action(), error = %e, "broadcast failed");
        }
    }

    /// Sends to a single user. Delivery failures are logged, not raised.
    pub(crate) fn reply(&self, user: &mut dyn User, message: &Message) {
        if let Err(e) = user.message(message) {
            warn!(game = %self.name, user = %user.id(), action = %message.action(), error = %e, "reply failed");
        }
    }
}

/// One game session.
///
/// `Game` is synchronous and single-threaded: feed it messages with
/// [`receive_message`](Self::receive_message) and time with
/// [`tick`](Self::tick), and it answers through its [`GameConnection`] and
/// the [`User`] it was handed. Whoever owns it serializes those calls (the
/// session actor does this in production).
///
/// ```rust
/// use bazaar_game::{Game, GameConfig, GameConnection, GameError};
/// use bazaar_protocol::{Message, PhaseName};
///
/// #[derive(Default)]
/// struct Log(Vec<Message>);
///
/// impl GameConnection for Log {
///     fn broadcast(&mut self, message: &Message) -> Result<(), GameError> {
///         self.0.push(message.clone());
///         Ok(())
///     }
/// }
///
/// let mut game = Game::new("demo", Log::default(), GameConfig::default());
/// game.change_state(PhaseName::Trade);
/// assert_eq!(game.phase_name(), PhaseName::Trade);
/// assert_eq!(
///     game.connection().0[0],
///     Message::GameStateChanged { new_state: PhaseName::Trade }
/// );
/// ```
#[derive(Debug)]
pub struct Game<C: GameConnection> {
    phase: Phase,
    ctx: GameContext<C>,
    /// Per-commodity production multiplier. Everything yields 1.0 for now.
    yields: HashMap<CommodityType, f64>,
}

impl<C: GameConnection> Game<C> {
    /// Creates a session in the waiting phase. Nothing is broadcast.
    pub fn new(name: impl Into<String>, connection: C, config: GameConfig) -> Self {
        let config = config.validated();
        let name = name.into();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let market = Market::new(config.market.clone());
        let yields = market
            .commodities()
            .iter()
            .map(|c| (c.clone(), 1.0))
            .collect();

        info!(game = %name, min_players = config.min_players, seed = ?config.seed, "game created");

        let mut game = Self {
            phase: Phase::new(PhaseName::Waiting),
            ctx: GameContext {
                name,
                connection,
                clock: GameClock::new(),
                market,
                rng,
                config,
            },
            yields,
        };
        let next = game.phase.begin(&mut game.ctx);
        game.follow(next);
        game
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn phase_name(&self) -> PhaseName {
        self.phase.name()
    }

    /// Last processed session time.
    pub fn now(&self) -> Duration {
        self.ctx.clock.now()
    }

    pub fn clock(&self) -> &GameClock {
        &self.ctx.clock
    }

    pub fn market(&self) -> &Market {
        &self.ctx.market
    }

    pub fn config(&self) -> &GameConfig {
        &self.ctx.config
    }

    pub fn connection(&self) -> &C {
        &self.ctx.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.ctx.connection
    }

    /// Production multiplier for a commodity. `1.0` for anything unlisted.
    pub fn yield_of(&self, commodity: &CommodityType) -> f64 {
        self.yields.get(commodity).copied().unwrap_or(1.0)
    }

    /// Arms the session timeout `delay` from now, replacing any armed one.
    pub fn set_timeout(&mut self, delay: Duration) {
        self.ctx.clock.set_timeout(delay);
    }

    /// Advances session time to `now` and fires the timeout if it's due.
    ///
    /// Stale times and ticks with nothing armed do nothing.
    pub fn tick(&mut self, now: Duration) {
        let Some(at) = self.ctx.clock.advance(now) else {
            return;
        };
        let next = self.phase.timer(&mut self.ctx, at);
        self.follow(next);
    }

    /// Handles one inbound message from `user`.
    ///
    /// Session-wide actions are handled first, whatever the phase; then the
    /// message goes to the active phase, which ignores what it doesn't use.
    pub fn receive_message(&mut self, user: &mut dyn User, message: Message) {
        match &message {
            Message::Join => {
                let welcome = Message::Welcome {
                    game: self.ctx.name.clone(),
                    state: self.phase.name(),
                };
                self.ctx.reply(user, &welcome);
            }
            Message::SetName { name } => {
                debug!(game = %self.ctx.name, user = %user.id(), from = %user.name(), to = %name, "user renamed");
                user.set_name(name.clone());
            }
            Message::ActivateEffect { id, .. } => {
                let effect = Message::EffectActivated {
                    id: *id,
                    author: user.name().to_owned(),
                };
                self.ctx.broadcast(&effect);
            }
            Message::Tick { tick_ms } => {
                if !self.ctx.config.debug_ticks {
                    debug!(game = %self.ctx.name, user = %user.id(), "client tick ignored");
                } else if let Ok(now) = Duration::try_from_secs_f64(tick_ms / 1000.0) {
                    self.tick(now);
                } else {
                    debug!(game = %self.ctx.name, user = %user.id(), tick_ms, "client tick out of range");
                }
            }
            _ => {}
        }

        let next = self.phase.receive(&mut self.ctx, user, &message);
        self.follow(next);
    }

    /// Switches to `next`.
    ///
    /// Ends the current phase, disarms the timeout, broadcasts
    /// `game_state_changed`, then begins `next`. If `begin` asks for another
    /// transition, that one follows immediately.
    pub fn change_state(&mut self, next: PhaseName) {
        let mut next = Some(next);
        while let Some(phase) = next {
            next = self.enter(phase);
        }
    }

    fn follow(&mut self, next: Transition) {
        if let Some(phase) = next {
            self.change_state(phase);
        }
    }

    fn enter(&mut self, next: PhaseName) -> Transition {
        let previous = self.phase.name();
        self.phase.end(&mut self.ctx);
        self.ctx.clock.clear_timeout();

        info!(game = %self.ctx.name, from = %previous, to = %next, "phase changed");
        self.ctx
            .broadcast(&Message::GameStateChanged { new_state: next });

        self.phase = Phase::new(next);
        self.phase.begin(&mut self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameError;
    use bazaar_protocol::UserId;

    #[derive(Default)]
    struct Log(Vec<Message>);

    impl GameConnection for Log {
        fn broadcast(&mut self, message: &Message) -> Result<(), GameError> {
            self.0.push(message.clone());
            Ok(())
        }
    }

    struct Broken;

    impl GameConnection for Broken {
        fn broadcast(&mut self, _message: &Message) -> Result<(), GameError> {
            Err(GameError::Disconnected(UserId(0)))
        }
    }

    struct Silent(UserId, String);

    impl User for Silent {
        fn id(&self) -> UserId {
            self.0
        }
        fn name(&self) -> &str {
            &self.1
        }
        fn set_name(&mut self, name: String) {
            self.1 = name;
        }
        fn message(&mut self, _message: &Message) -> Result<(), GameError> {
            Err(GameError::Disconnected(self.0))
        }
    }

    fn seeded() -> GameConfig {
        GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_new_game_waits_silently() {
        let game = Game::new("g", Log::default(), seeded());
        assert_eq!(game.phase_name(), PhaseName::Waiting);
        assert!(game.connection().0.is_empty());
        assert!(!game.clock().is_armed());
    }

    #[test]
    fn test_yields_default_to_one() {
        let game = Game::new("g", Log::default(), seeded());
        assert_eq!(game.yield_of(&CommodityType::new("corn")), 1.0);
        assert_eq!(game.yield_of(&CommodityType::new("gold")), 1.0);
    }

    #[test]
    fn test_change_state_clears_timeout() {
        let mut game = Game::new("g", Log::default(), seeded());
        game.set_timeout(Duration::from_secs(1));
        game.change_state(PhaseName::Trade);
        // Only the trading timeout is armed now.
        assert_eq!(game.clock().deadline(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_empty_auction_goes_straight_to_trade() {
        let config = GameConfig {
            auction_lots: Some(Vec::new()),
            ..seeded()
        };
        let mut game = Game::new("g", Log::default(), config);
        game.change_state(PhaseName::Auction);

        assert_eq!(game.phase_name(), PhaseName::Trade);
        assert_eq!(
            game.connection().0,
            vec![
                Message::GameStateChanged {
                    new_state: PhaseName::Auction
                },
                Message::GameStateChanged {
                    new_state: PhaseName::Trade
                },
                Message::set_clock(Duration::from_secs(60)),
            ]
        );
    }

    #[test]
    fn test_delivery_failures_do_not_stop_the_game() {
        let mut game = Game::new("g", Broken, seeded());
        let mut user = Silent(UserId(1), "a".into());
        game.receive_message(&mut user, Message::Join);
        game.receive_message(&mut user, Message::Ready { ready: true });
        game.change_state(PhaseName::Auction);
        assert_eq!(game.phase_name(), PhaseName::Auction);
    }

    #[test]
    fn test_client_ticks_ignored_unless_enabled() {
        let mut game = Game::new("g", Log::default(), seeded());
        let mut user = Silent(UserId(1), "a".into());
        game.change_state(PhaseName::Trade);

        game.receive_message(&mut user, Message::Tick { tick_ms: 61_000.0 });
        assert_eq!(game.phase_name(), PhaseName::Trade);
        assert_eq!(game.now(), Duration::ZERO);
    }

    #[test]
    fn test_client_ticks_drive_clock_when_enabled() {
        let config = GameConfig {
            debug_ticks: true,
            ..seeded()
        };
        let mut game = Game::new("g", Log::default(), config);
        let mut user = Silent(UserId(1), "a".into());
        game.change_state(PhaseName::Trade);

        game.receive_message(&mut user, Message::Tick { tick_ms: -5.0 });
        assert_eq!(game.now(), Duration::ZERO);

        game.receive_message(&mut user, Message::Tick { tick_ms: 61_000.0 });
        assert_eq!(game.phase_name(), PhaseName::Waiting);
        assert_eq!(game.now(), Duration::from_secs(61));
    }
}
