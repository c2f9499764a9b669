//! Per-connection handler: attach to a game and pump frames both ways.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Look up (or create) the game named by the request path
//!   2. Attach the user with a fresh outbound channel
//!   3. Spawn a writer: outbound messages → text frames
//!   4. Loop: receive frames → decode → forward to the game
//!   5. On close, detach (the game sees an implicit `leave`)

use std::sync::Arc;

use bazaar_game::{GameError, GameHandle, UserSender};
use bazaar_protocol::{Codec, Message, UserId, decode_message};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as Frame;
use tracing::{debug, info, warn};

use crate::BazaarError;
use crate::server::ServerState;
use crate::transport::{WebSocketConnection, WsStream};

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), BazaarError> {
    let WebSocketConnection { user_id, game, ws } = conn;

    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let handle = attach(&state, &game, user_id, outbox_tx).await?;
    info!(%user_id, %game, "user attached");

    let (sink, mut stream) = ws.split();
    let writer = tokio::spawn(write_frames(user_id, sink, outbox_rx, Arc::clone(&state)));

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!(%user_id, error = %e, "recv error");
                break;
            }
        };

        let data: &[u8] = match &frame {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => &data[..],
            Frame::Close(_) => {
                info!(%user_id, "connection closed cleanly");
                break;
            }
            _ => continue, // ping/pong/raw frame
        };

        match decode_message(&state.codec, data) {
            Ok(message) => {
                if let Err(e) = handle.send_message(user_id, message).await {
                    warn!(%user_id, %game, error = %e, "game unavailable");
                    break;
                }
            }
            Err(e) => {
                debug!(%user_id, error = %e, "failed to decode message");
            }
        }
    }

    if let Err(e) = handle.disconnect(user_id).await {
        debug!(%user_id, error = %e, "detach failed");
    }
    writer.abort();
    Ok(())
}

/// Attaches `user_id` to `game`. A game that closes between lookup and
/// attach (its last user just left) is replaced once.
async fn attach(
    state: &ServerState,
    game: &str,
    user_id: UserId,
    outbox: UserSender,
) -> Result<GameHandle, BazaarError> {
    let mut retried = false;
    loop {
        let handle = state.games.lock().await.get_or_create(game);
        match handle.connect(user_id, String::new(), outbox.clone()).await {
            Ok(()) => return Ok(handle),
            Err(GameError::Unavailable(_)) if !retried => {
                debug!(%user_id, %game, "game closed during attach, retrying");
                retried = true;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Encodes outbound messages as text frames until the game drops the
/// channel or the socket fails.
async fn write_frames(
    user_id: UserId,
    mut sink: SplitSink<WsStream, Frame>,
    mut outbox: mpsc::UnboundedReceiver<Message>,
    state: Arc<ServerState>,
) {
    while let Some(message) = outbox.recv().await {
        let bytes = match state.codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%user_id, action = %message.action(), error = %e, "failed to encode message");
                continue;
            }
        };
        let frame = match String::from_utf8(bytes) {
            Ok(text) => Frame::text(text),
            Err(e) => Frame::binary(e.into_bytes()),
        };
        if let Err(e) = sink.send(frame).await {
            debug!(%user_id, error = %e, "send failed");
            break;
        }
    }
    let _ = sink.close().await;
}
