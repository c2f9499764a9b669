//! Game manager: creates, tracks, and tears down named sessions.

use std::collections::HashMap;

use bazaar_clock::TickerConfig;
use tracing::{debug, info};

use crate::actor::spawn_game;
use crate::{GameConfig, GameError, GameHandle, GameInfo};

/// Default command channel size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// All running sessions, keyed by name.
///
/// Every session started by one manager shares the same [`GameConfig`] and
/// [`TickerConfig`]. This is the entry point from the server's accept loop.
pub struct GameManager {
    games: HashMap<String, GameHandle>,
    config: GameConfig,
    ticker: TickerConfig,
}

impl GameManager {
    /// Creates an empty manager.
    pub fn new(config: GameConfig, ticker: TickerConfig) -> Self {
        Self {
            games: HashMap::new(),
            config,
            ticker,
        }
    }

    /// Returns the running session called `name`, starting it if needed.
    ///
    /// A session whose actor has stopped is replaced by a fresh one, and
    /// every other stopped session is forgotten.
    pub fn get_or_create(&mut self, name: &str) -> GameHandle {
        if let Some(handle) = self.games.get(name) {
            if !handle.is_closed() {
                return handle.clone();
            }
            info!(game = %name, "replacing stopped game");
        }
        self.prune();

        let handle = spawn_game(
            name,
            self.config.clone(),
            self.ticker.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.games.insert(name.to_owned(), handle.clone());
        info!(game = %name, games = self.games.len(), "game created");
        handle
    }

    /// Forgets sessions whose actors have stopped, e.g. after their last
    /// user left. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.games.len();
        self.games.retain(|_, handle| !handle.is_closed());
        let removed = before - self.games.len();
        if removed > 0 {
            debug!(removed, games = self.games.len(), "pruned stopped games");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&GameHandle> {
        self.games.get(name)
    }

    /// Info about one session.
    pub async fn get_game_info(&self, name: &str) -> Result<GameInfo, GameError> {
        let handle = self
            .games
            .get(name)
            .ok_or_else(|| GameError::NotFound(name.to_owned()))?;
        handle.get_info().await
    }

    /// Shuts a session down and forgets it.
    pub async fn destroy_game(&mut self, name: &str) -> Result<(), GameError> {
        let handle = self
            .games
            .remove(name)
            .ok_or_else(|| GameError::NotFound(name.to_owned()))?;

        let _ = handle.shutdown().await;

        info!(game = %name, "game destroyed");
        Ok(())
    }

    /// Info about every live session, sorted by name.
    ///
    /// Sessions that fail to respond (e.g., shutting down) are silently
    /// skipped.
    pub async fn list_games(&self) -> Vec<GameInfo> {
        let mut infos = Vec::with_capacity(self.games.len());
        for handle in self.games.values() {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Returns the number of tracked sessions.
    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Lists all tracked session names, sorted.
    pub fn game_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.games.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for GameManager {
    fn default() -> Self {
        Self::new(GameConfig::default(), TickerConfig::default())
    }
}
