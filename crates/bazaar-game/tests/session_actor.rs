//! Integration tests for the session actor and the game manager.

use std::time::Duration;

use bazaar_clock::TickerConfig;
use bazaar_game::{GameConfig, GameError, GameHandle, GameManager, spawn_game};
use bazaar_protocol::{Message, PhaseName, PlayerInfo, UserId};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn uid(n: u64) -> UserId {
    UserId(n)
}

fn config() -> GameConfig {
    GameConfig {
        seed: Some(7),
        auction_lots: Some(vec!["corn".into()]),
        ..GameConfig::default()
    }
}

fn manual_game(name: &str) -> GameHandle {
    spawn_game(name, config(), TickerConfig::event_driven(), 16)
}

fn manager() -> GameManager {
    GameManager::new(config(), TickerConfig::event_driven())
}

type Outbox = mpsc::UnboundedReceiver<Message>;

async fn connect(handle: &GameHandle, n: u64, name: &str) -> Outbox {
    let (tx, rx) = mpsc::unbounded_channel();
    handle.connect(uid(n), name, tx).await.unwrap();
    rx
}

/// Everything delivered so far. The `get_info` round trip guarantees the
/// actor has processed every earlier command.
async fn drain(handle: &GameHandle, outbox: &mut Outbox) -> Vec<Message> {
    handle.get_info().await.unwrap();
    let mut messages = Vec::new();
    while let Ok(message) = outbox.try_recv() {
        messages.push(message);
    }
    messages
}

async fn phase(handle: &GameHandle) -> PhaseName {
    handle.get_info().await.unwrap().phase
}

/// Lets the actor run until its channel closes.
async fn wait_closed(handle: &GameHandle) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !handle.is_closed() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("game should have stopped");
}

// =========================================================================
// GameHandle
// =========================================================================

#[tokio::test]
async fn test_join_gets_welcome_and_roster() {
    let game = manual_game("g");
    let mut a = connect(&game, 1, "alice").await;

    game.send_message(uid(1), Message::Join).await.unwrap();

    assert_eq!(
        drain(&game, &mut a).await,
        vec![
            Message::Welcome {
                game: "g".into(),
                state: PhaseName::Waiting,
            },
            Message::PlayerInfoUpdated {
                info: vec![PlayerInfo {
                    name: "alice".into(),
                    ready: false,
                }],
            },
        ]
    );
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let game = manual_game("g");
    let _a = connect(&game, 1, "alice").await;

    let (tx, _rx) = mpsc::unbounded_channel();
    let result = game.connect(uid(1), "again", tx).await;
    assert!(matches!(result, Err(GameError::AlreadyConnected(UserId(1), _))));
}

#[tokio::test]
async fn test_message_from_unknown_user_is_ignored() {
    let game = manual_game("g");
    let mut a = connect(&game, 1, "alice").await;

    game.send_message(uid(99), Message::ActivateEffect { id: 1, timeout: 0 })
        .await
        .unwrap();
    assert!(drain(&game, &mut a).await.is_empty());
}

#[tokio::test]
async fn test_broadcasts_reach_everyone_in_order() {
    let game = manual_game("g");
    let mut a = connect(&game, 1, "alice").await;
    let mut b = connect(&game, 2, "bob").await;

    game.send_message(uid(1), Message::Ready { ready: true }).await.unwrap();
    game.send_message(uid(2), Message::Ready { ready: true }).await.unwrap();

    let seen_by_a = drain(&game, &mut a).await;
    let seen_by_b = drain(&game, &mut b).await;
    assert_eq!(seen_by_a, seen_by_b);

    let actions: Vec<&str> = seen_by_a.iter().map(|m| m.action().as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "player_info_updated",
            "player_info_updated",
            "game_state_changed",
            "auction_seed",
            "set_clock",
        ]
    );
    assert_eq!(phase(&game).await, PhaseName::Auction);
}

#[tokio::test]
async fn test_disconnect_acts_as_leave() {
    let game = manual_game("g");
    let mut a = connect(&game, 1, "alice").await;
    let _b = connect(&game, 2, "bob").await;
    let _c = connect(&game, 3, "carol").await;

    game.send_message(uid(1), Message::Ready { ready: true }).await.unwrap();
    game.send_message(uid(2), Message::Join).await.unwrap();
    game.send_message(uid(3), Message::Ready { ready: true }).await.unwrap();
    assert_eq!(phase(&game).await, PhaseName::Waiting);

    game.disconnect(uid(2)).await.unwrap();
    assert_eq!(phase(&game).await, PhaseName::Auction);

    let info = game.get_info().await.unwrap();
    assert_eq!(info.users, 2);

    let last_roster = drain(&game, &mut a)
        .await
        .into_iter()
        .filter(|m| matches!(m, Message::PlayerInfoUpdated { .. }))
        .last();
    assert_eq!(
        last_roster,
        Some(Message::PlayerInfoUpdated {
            info: vec![
                PlayerInfo {
                    name: "alice".into(),
                    ready: true,
                },
                PlayerInfo {
                    name: "carol".into(),
                    ready: true,
                },
            ],
        })
    );
}

#[tokio::test]
async fn test_game_stops_when_last_user_leaves() {
    let game = manual_game("g");
    let _a = connect(&game, 1, "alice").await;
    let _b = connect(&game, 2, "bob").await;

    game.disconnect(uid(1)).await.unwrap();
    assert_eq!(game.get_info().await.unwrap().users, 1);

    game.disconnect(uid(2)).await.unwrap();
    wait_closed(&game).await;
    assert!(matches!(game.get_info().await, Err(GameError::Unavailable(_))));
}

#[tokio::test]
async fn test_unknown_disconnect_keeps_empty_game_running() {
    let game = manual_game("g");
    game.disconnect(uid(5)).await.unwrap();

    assert_eq!(game.get_info().await.unwrap().users, 0);
    assert!(!game.is_closed());
}

#[tokio::test]
async fn test_manual_ticks_drive_the_clock() {
    let game = manual_game("g");
    let mut a = connect(&game, 1, "alice").await;
    let _b = connect(&game, 2, "bob").await;
    game.send_message(uid(1), Message::Ready { ready: true }).await.unwrap();
    game.send_message(uid(2), Message::Ready { ready: true }).await.unwrap();
    drain(&game, &mut a).await;

    game.tick(Duration::from_secs(10)).await.unwrap();
    assert_eq!(phase(&game).await, PhaseName::Auction);

    game.tick(Duration::from_millis(10_001)).await.unwrap();
    assert_eq!(phase(&game).await, PhaseName::Trade);
    assert_eq!(
        drain(&game, &mut a).await,
        vec![
            Message::GameStateChanged {
                new_state: PhaseName::Trade,
            },
            Message::set_clock(Duration::from_secs(60)),
        ]
    );

    let info = game.get_info().await.unwrap();
    assert_eq!(info.elapsed, Duration::from_millis(10_001));
}

#[tokio::test(start_paused = true)]
async fn test_wall_clock_ticker_closes_rounds() {
    let config = GameConfig {
        auction_bid_time: Duration::from_millis(250),
        ..config()
    };
    let ticker = TickerConfig {
        initial_jitter_us: 0,
        ..TickerConfig::with_interval(Duration::from_millis(100))
    };
    let game = spawn_game("g", config, ticker, 16);
    let _a = connect(&game, 1, "alice").await;
    let _b = connect(&game, 2, "bob").await;
    game.send_message(uid(1), Message::Ready { ready: true }).await.unwrap();
    game.send_message(uid(2), Message::Ready { ready: true }).await.unwrap();
    assert_eq!(phase(&game).await, PhaseName::Auction);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(phase(&game).await, PhaseName::Trade);
}

#[tokio::test]
async fn test_shutdown_closes_handle() {
    let game = manual_game("g");
    game.shutdown().await.unwrap();

    let result = game.get_info().await;
    assert!(matches!(result, Err(GameError::Unavailable(_))));
    assert!(game.is_closed());
}

// =========================================================================
// GameManager
// =========================================================================

#[tokio::test]
async fn test_get_or_create_reuses_running_game() {
    let mut mgr = manager();
    let first = mgr.get_or_create("lobby");
    let second = mgr.get_or_create("lobby");

    let _a = connect(&first, 1, "alice").await;
    assert_eq!(second.get_info().await.unwrap().users, 1);
    assert_eq!(mgr.game_count(), 1);
}

#[tokio::test]
async fn test_games_are_isolated() {
    let mut mgr = manager();
    let north = mgr.get_or_create("north");
    let south = mgr.get_or_create("south");

    let mut a = connect(&north, 1, "alice").await;
    let mut b = connect(&south, 2, "bob").await;
    north
        .send_message(uid(1), Message::ActivateEffect { id: 4, timeout: 0 })
        .await
        .unwrap();

    assert_eq!(drain(&north, &mut a).await.len(), 1);
    assert!(drain(&south, &mut b).await.is_empty());
    assert_eq!(mgr.game_names(), vec!["north".to_owned(), "south".to_owned()]);
}

#[tokio::test]
async fn test_get_game_info() {
    let mut mgr = manager();
    mgr.get_or_create("g");

    let info = mgr.get_game_info("g").await.unwrap();
    assert_eq!(info.name, "g");
    assert_eq!(info.phase, PhaseName::Waiting);
    assert_eq!(info.users, 0);
    assert_eq!(info.elapsed, Duration::ZERO);

    let missing = mgr.get_game_info("nope").await;
    assert!(matches!(missing, Err(GameError::NotFound(_))));
}

#[tokio::test]
async fn test_list_games_sorted_by_name() {
    let mut mgr = manager();
    mgr.get_or_create("b");
    mgr.get_or_create("a");

    let names: Vec<String> = mgr.list_games().await.into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["a".to_owned(), "b".to_owned()]);
}

#[tokio::test]
async fn test_destroy_game() {
    let mut mgr = manager();
    let handle = mgr.get_or_create("g");

    mgr.destroy_game("g").await.unwrap();
    assert_eq!(mgr.game_count(), 0);
    assert!(mgr.get("g").is_none());

    // The actor drains its channel and stops.
    let result = handle.get_info().await;
    assert!(result.is_err());

    let again = mgr.destroy_game("g").await;
    assert!(matches!(again, Err(GameError::NotFound(_))));
}

#[tokio::test]
async fn test_stopped_game_is_replaced() {
    let mut mgr = manager();
    let old = mgr.get_or_create("g");
    old.shutdown().await.unwrap();
    while !old.is_closed() {
        tokio::task::yield_now().await;
    }

    let fresh = mgr.get_or_create("g");
    assert!(fresh.get_info().await.is_ok());
    assert_eq!(mgr.game_count(), 1);
}

#[tokio::test]
async fn test_abandoned_games_are_forgotten() {
    let mut mgr = manager();
    for n in 0..50 {
        let handle = mgr.get_or_create(&format!("r{n}"));
        let _outbox = connect(&handle, n, "visitor").await;
        handle.disconnect(uid(n)).await.unwrap();
        wait_closed(&handle).await;
    }
    // Each creation forgets the previously abandoned game.
    assert_eq!(mgr.game_count(), 1);
    assert_eq!(mgr.prune(), 1);
    assert_eq!(mgr.game_count(), 0);

    let busy = mgr.get_or_create("busy");
    let _a = connect(&busy, 1, "alice").await;
    assert_eq!(mgr.prune(), 0);
    assert_eq!(mgr.game_names(), vec!["busy".to_owned()]);
}
