//! `BazaarServer` builder and server loop.
//!
//! This is the entry point for running a Bazaar server. It ties together
//! all the layers: transport → protocol → game.

use std::sync::Arc;
use std::time::Duration;

use bazaar_clock::TickerConfig;
use bazaar_game::{GameConfig, GameManager};
use bazaar_protocol::JsonCodec;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::BazaarError;
use crate::handler::handle_connection;
use crate::transport::{DEFAULT_HANDSHAKE_TIMEOUT, WebSocketListener, upgrade};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState {
    pub(crate) games: Mutex<GameManager>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Bazaar server.
///
/// # Example
///
/// ```rust,no_run
/// use bazaar::BazaarServerBuilder;
///
/// # async fn run() -> Result<(), bazaar::BazaarError> {
/// let server = BazaarServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BazaarServerBuilder {
    bind_addr: String,
    game_config: GameConfig,
    ticker: TickerConfig,
    handshake_timeout: Duration,
}

impl BazaarServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            game_config: GameConfig::default(),
            ticker: TickerConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules every game on this server is created with.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets how each game's clock is driven.
    pub fn ticker(mut self, config: TickerConfig) -> Self {
        self.ticker = config;
        self
    }

    /// Sets how long a new connection may take to send its upgrade request.
    pub fn handshake_timeout(mut self, limit: Duration) -> Self {
        self.handshake_timeout = limit;
        self
    }

    /// Binds the listener.
    pub async fn build(self) -> Result<BazaarServer, BazaarError> {
        let listener = WebSocketListener::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            games: Mutex::new(GameManager::new(self.game_config, self.ticker)),
            codec: JsonCodec,
        });

        Ok(BazaarServer {
            listener,
            state,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl Default for BazaarServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Bazaar server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BazaarServer {
    listener: WebSocketListener,
    state: Arc<ServerState>,
    handshake_timeout: Duration,
}

impl BazaarServer {
    /// Creates a new builder.
    pub fn builder() -> BazaarServerBuilder {
        BazaarServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a task for each one that
    /// performs the WebSocket upgrade and then serves the user. Runs until
    /// the process is terminated.
    pub async fn run(self) -> Result<(), BazaarError> {
        info!("Bazaar server running");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&self.state);
                    let limit = self.handshake_timeout;
                    tokio::spawn(async move {
                        let conn = match upgrade(stream, addr, limit).await {
                            Ok(conn) => conn,
                            Err(e) => {
                                debug!(%addr, error = %e, "handshake failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, state).await {
                            debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept failed");
                }
            }
        }
    }
}
