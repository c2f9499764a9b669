//! WebSocket listener using `tokio-tungstenite`.
//!
//! The upgrade request's path names the game to join: `ws://host/market`
//! joins `market`, and a bare `/` joins [`DEFAULT_GAME`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bazaar_protocol::UserId;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing::{debug, info};

use crate::BazaarError;

/// Game joined by clients that connect to `/`.
pub const DEFAULT_GAME: &str = "lobby";

/// How long a client has to finish the upgrade request after connecting.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Counter for generating unique user IDs.
static NEXT_USER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Listens for incoming WebSocket connections.
pub struct WebSocketListener {
    listener: TcpListener,
}

impl WebSocketListener {
    /// Binds to the given address.
    pub async fn bind(addr: &str) -> Result<Self, BazaarError> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the next TCP connection. The upgrade happens later, in
    /// [`upgrade`], on the connection's own task.
    pub(crate) async fn accept(&self) -> Result<(TcpStream, SocketAddr), BazaarError> {
        Ok(self.listener.accept().await?)
    }
}

/// Performs the WebSocket upgrade on an accepted stream, giving up if the
/// client hasn't finished it within `limit`.
pub(crate) async fn upgrade(
    stream: TcpStream,
    addr: SocketAddr,
    limit: Duration,
) -> Result<WebSocketConnection, BazaarError> {
    let mut path = String::new();
    let handshake = tokio_tungstenite::accept_hdr_async(
        stream,
        |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            path = request.uri().path().to_owned();
            Ok(response)
        },
    );
    let ws = tokio::time::timeout(limit, handshake)
        .await
        .map_err(|_| BazaarError::HandshakeTimeout(addr))??;

    let user_id = UserId(NEXT_USER_ID.fetch_add(1, Ordering::Relaxed));
    let game = game_name(&path);
    debug!(%user_id, %addr, %game, "accepted WebSocket connection");

    Ok(WebSocketConnection { user_id, game, ws })
}

/// One upgraded connection, not yet attached to a game.
pub(crate) struct WebSocketConnection {
    pub(crate) user_id: UserId,
    pub(crate) game: String,
    pub(crate) ws: WsStream,
}

/// Maps a request path to a game name: the first path segment, or
/// [`DEFAULT_GAME`] when there is none.
pub fn game_name(path: &str) -> String {
    match path.trim_start_matches('/').split('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_owned(),
        _ => DEFAULT_GAME.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_name_from_path() {
        assert_eq!(game_name("/g"), "g");
        assert_eq!(game_name("/market/extra"), "market");
        assert_eq!(game_name("/"), DEFAULT_GAME);
        assert_eq!(game_name(""), DEFAULT_GAME);
        assert_eq!(game_name("//"), DEFAULT_GAME);
    }

    #[tokio::test]
    async fn test_upgrade_gives_up_on_silent_client() {
        let listener = WebSocketListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _silent = TcpStream::connect(addr).await.unwrap();

        let (stream, peer) = listener.accept().await.unwrap();
        let result = upgrade(stream, peer, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(BazaarError::HandshakeTimeout(a)) if a == peer));
    }
}
