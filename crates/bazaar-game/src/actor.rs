//! Session actor: an isolated Tokio task that owns one [`Game`].
//!
//! Each session runs in its own task, communicating with the outside world
//! through an mpsc channel. This is the "actor model": no shared mutable
//! state, just message passing. Commands and clock ticks are handled one at
//! a time, which is what gives broadcasts their order.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use bazaar_clock::{Ticker, TickerConfig};
use bazaar_protocol::{Message, PhaseName, UserId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::{Game, GameConfig, GameConnection, GameError, User};

/// Channel sender for delivering outbound messages to one user.
pub type UserSender = mpsc::UnboundedSender<Message>;

/// Commands sent to a session actor through its channel.
///
/// The `oneshot::Sender` in some variants is a "reply channel": the
/// caller sends a command and waits for the response on that channel.
pub(crate) enum GameCommand {
    /// Attach a user's outbound channel.
    Connect {
        user_id: UserId,
        name: String,
        outbox: UserSender,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// Detach a user. Acts as an implicit `leave`. The actor stops once
    /// its last user is gone.
    Disconnect { user_id: UserId },

    /// Deliver a decoded message from a user.
    Message { user_id: UserId, message: Message },

    /// Advance the session clock by hand.
    Tick { elapsed: Duration },

    /// Request a snapshot of session metadata.
    GetInfo { reply: oneshot::Sender<GameInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of session metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    pub name: String,
    pub phase: PhaseName,
    /// Users currently attached.
    pub users: usize,
    /// Last processed session time.
    pub elapsed: Duration,
}

/// Handle to a running session actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. The
/// [`GameManager`](crate::GameManager) holds one per session.
#[derive(Debug, Clone)]
pub struct GameHandle {
    name: String,
    sender: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> GameError {
        GameError::Unavailable(self.name.clone())
    }

    async fn send(&self, command: GameCommand) -> Result<(), GameError> {
        self.sender.send(command).await.map_err(|_| self.unavailable())
    }

    /// Attaches a user. Messages for them arrive on `outbox`.
    pub async fn connect(
        &self,
        user_id: UserId,
        name: impl Into<String>,
        outbox: UserSender,
    ) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::Connect {
            user_id,
            name: name.into(),
            outbox,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Detaches a user (fire-and-forget). The game sees a `leave`, and
    /// the actor stops if nobody is left.
    pub async fn disconnect(&self, user_id: UserId) -> Result<(), GameError> {
        self.send(GameCommand::Disconnect { user_id }).await
    }

    /// Delivers a message from a user (fire-and-forget).
    pub async fn send_message(&self, user_id: UserId, message: Message) -> Result<(), GameError> {
        self.send(GameCommand::Message { user_id, message }).await
    }

    /// Moves the session clock to `elapsed` (fire-and-forget).
    pub async fn tick(&self, elapsed: Duration) -> Result<(), GameError> {
        self.send(GameCommand::Tick { elapsed }).await
    }

    pub async fn get_info(&self) -> Result<GameInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(GameCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(GameCommand::Shutdown).await
    }
}

// ---------------------------------------------------------------------------
// Collaborators backed by channels
// ---------------------------------------------------------------------------

/// A connected user: an id, a display name, and an outbound channel.
#[derive(Debug)]
struct RemoteUser {
    id: UserId,
    name: String,
    outbox: UserSender,
}

impl User for RemoteUser {
    fn id(&self) -> UserId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn message(&mut self, message: &Message) -> Result<(), GameError> {
        self.outbox
            .send(message.clone())
            .map_err(|_| GameError::Disconnected(self.id))
    }
}

/// Every attached user's outbound channel, in id order.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    outboxes: BTreeMap<UserId, UserSender>,
}

impl Roster {
    fn attach(&mut self, user_id: UserId, outbox: UserSender) {
        self.outboxes.insert(user_id, outbox);
    }

    fn detach(&mut self, user_id: UserId) {
        self.outboxes.remove(&user_id);
    }
}

impl GameConnection for Roster {
    fn broadcast(&mut self, message: &Message) -> Result<(), GameError> {
        let mut result = Ok(());
        for (user_id, outbox) in &self.outboxes {
            if outbox.send(message.clone()).is_err() && result.is_ok() {
                result = Err(GameError::Disconnected(*user_id));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The internal actor state. Runs inside a Tokio task.
struct GameActor {
    game: Game<Roster>,
    users: HashMap<UserId, RemoteUser>,
    ticker: Ticker,
    receiver: mpsc::Receiver<GameCommand>,
}

impl GameActor {
    /// Runs the actor loop, processing commands and ticks until shutdown.
    async fn run(mut self) {
        info!(game = %self.game.name(), "game actor started");

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle(command) {
                        break;
                    }
                }
                tick = self.ticker.wait_for_tick() => {
                    self.game.tick(tick.elapsed);
                }
            }
        }

        info!(game = %self.game.name(), "game actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle(&mut self, command: GameCommand) -> bool {
        match command {
            GameCommand::Connect {
                user_id,
                name,
                outbox,
                reply,
            } => {
                let _ = reply.send(self.handle_connect(user_id, name, outbox));
            }
            GameCommand::Disconnect { user_id } => {
                if self.handle_disconnect(user_id) && self.users.is_empty() {
                    info!(game = %self.game.name(), "last user left, closing game");
                    return false;
                }
            }
            GameCommand::Message { user_id, message } => {
                let Some(user) = self.users.get_mut(&user_id) else {
                    warn!(game = %self.game.name(), %user_id, "message from unknown user");
                    return true;
                };
                self.game.receive_message(user, message);
            }
            GameCommand::Tick { elapsed } => self.game.tick(elapsed),
            GameCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            GameCommand::Shutdown => {
                info!(game = %self.game.name(), "game shutting down");
                return false;
            }
        }
        true
    }

    fn handle_connect(
        &mut self,
        user_id: UserId,
        name: String,
        outbox: UserSender,
    ) -> Result<(), GameError> {
        if self.users.contains_key(&user_id) {
            return Err(GameError::AlreadyConnected(user_id, self.game.name().to_owned()));
        }

        self.game.connection_mut().attach(user_id, outbox.clone());
        self.users.insert(
            user_id,
            RemoteUser {
                id: user_id,
                name,
                outbox,
            },
        );
        info!(game = %self.game.name(), %user_id, users = self.users.len(), "user connected");
        Ok(())
    }

    /// Returns whether `user_id` was attached.
    fn handle_disconnect(&mut self, user_id: UserId) -> bool {
        let Some(mut user) = self.users.remove(&user_id) else {
            debug!(game = %self.game.name(), %user_id, "disconnect for unknown user");
            return false;
        };
        self.game.connection_mut().detach(user_id);
        info!(game = %self.game.name(), %user_id, users = self.users.len(), "user disconnected");
        self.game.receive_message(&mut user, Message::Leave);
        true
    }

    fn info(&self) -> GameInfo {
        GameInfo {
            name: self.game.name().to_owned(),
            phase: self.game.phase_name(),
            users: self.users.len(),
            elapsed: self.game.now(),
        }
    }
}

/// Spawns a new session actor and returns a handle to it.
///
/// `channel_size` controls backpressure: if the channel fills up, senders
/// wait (bounded channel). With an event-driven `ticker` the clock only
/// moves on [`GameHandle::tick`].
pub fn spawn_game(
    name: impl Into<String>,
    config: GameConfig,
    ticker: TickerConfig,
    channel_size: usize,
) -> GameHandle {
    let name = name.into();
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = GameActor {
        game: Game::new(name.clone(), Roster::default(), config),
        users: HashMap::new(),
        ticker: Ticker::new(ticker),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    GameHandle { name, sender: tx }
}
