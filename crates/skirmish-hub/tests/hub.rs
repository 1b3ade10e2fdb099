//! Integration tests for the hub task: registration, presence, routing,
//! eviction, and grid cleanup on unregister.

use skirmish_game::{GameConfig, GameHandle, JoinOutcome, MemoryStore};
use skirmish_hub::{ClientHandle, HubConfig, HubError, HubHandle, Identity, PresenceKind};
use skirmish_protocol::{
    MovePayload, PresencePayload, ServerEvent, SessionId, UserId, UserSummary,
};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

// =========================================================================
// Helpers
// =========================================================================

fn sid(id: &str) -> SessionId {
    SessionId::new(id)
}

fn start() -> (HubHandle, GameHandle) {
    let game = GameHandle::spawn(GameConfig::default(), MemoryStore::new());
    let hub = HubHandle::spawn(HubConfig::default(), game.clone());
    (hub, game)
}

fn client(session: &str, user: i64, capacity: usize) -> (ClientHandle, mpsc::Receiver<ServerEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    let identity = Identity::new(UserId(user), format!("user{user}"));
    (ClientHandle::new(sid(session), identity, tx), rx)
}

fn summary(session: &str, user: i64) -> UserSummary {
    UserSummary {
        client_id: sid(session),
        user_id: UserId(user),
        user_name: format!("user{user}"),
    }
}

fn move_event(n: i32) -> ServerEvent {
    ServerEvent::Move(MovePayload {
        x: n,
        y: 0,
        client_id: sid("a"),
        user_name: "user1".into(),
    })
}

/// Every hub command is processed in order, so once a `presence()` reply
/// comes back, everything sent before it has been delivered.
async fn settle(hub: &HubHandle) {
    hub.presence().await.unwrap();
}

fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// =========================================================================
// register / unregister
// =========================================================================

#[tokio::test]
async fn test_register_broadcasts_join_including_new_session() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    let (b, mut rx_b) = client("b", 2, 16);

    hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();
    settle(&hub).await;

    let expected_b_join = ServerEvent::Join(PresencePayload {
        client_id: sid("b"),
        users: vec![summary("a", 1), summary("b", 2)],
    });
    let a_events = drain(&mut rx_a);
    assert_eq!(a_events.len(), 2);
    assert_eq!(a_events[1], expected_b_join);
    assert_eq!(drain(&mut rx_b), vec![expected_b_join]);
}

#[tokio::test]
async fn test_register_same_user_is_refused_and_presence_unchanged() {
    let (hub, _game) = start();
    let (first, mut rx_first) = client("first", 7, 16);
    let (second, mut rx_second) = client("second", 7, 16);

    hub.register(first).await.unwrap();
    let result = hub.register(second).await;

    assert!(matches!(result, Err(HubError::AlreadyOnline(UserId(7)))));
    assert_eq!(hub.presence().await.unwrap(), vec![summary("first", 7)]);
    // The refused session's queue was dropped without any event.
    assert_eq!(rx_second.try_recv(), Err(TryRecvError::Disconnected));
    // The first session saw only its own join.
    assert_eq!(drain(&mut rx_first).len(), 1);
}

#[tokio::test]
async fn test_unregister_broadcasts_disconnect_and_closes_queue() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    let (b, mut rx_b) = client("b", 2, 16);
    hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();
    settle(&hub).await;
    drain(&mut rx_b);

    hub.unregister(sid("a")).await.unwrap();

    assert_eq!(
        drain(&mut rx_b),
        vec![ServerEvent::Disconnect(PresencePayload {
            client_id: sid("a"),
            users: vec![summary("b", 2)],
        })]
    );
    drain(&mut rx_a);
    assert_eq!(rx_a.try_recv(), Err(TryRecvError::Disconnected));
    assert_eq!(hub.presence().await.unwrap(), vec![summary("b", 2)]);
}

#[tokio::test]
async fn test_unregister_removes_grid_position_and_broadcasts_join_game() {
    let (hub, game) = start();
    let (a, _rx_a) = client("a", 1, 16);
    let (b, mut rx_b) = client("b", 2, 16);
    hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();
    let JoinOutcome::Joined { position, .. } = game.join(sid("a")).await.unwrap() else {
        panic!("join should place the session");
    };
    settle(&hub).await;
    drain(&mut rx_b);

    hub.unregister(sid("a")).await.unwrap();

    let events = drain(&mut rx_b);
    assert_eq!(events.len(), 2, "expected disconnect then joinGame: {events:?}");
    assert!(matches!(events[0], ServerEvent::Disconnect(_)));
    let ServerEvent::JoinGame(payload) = &events[1] else {
        panic!("expected joinGame, got {:?}", events[1]);
    };
    assert!(payload.joining.is_empty());
    assert_eq!(payload.disconnecting.len(), 1);
    assert_eq!(payload.disconnecting[0].user, summary("a", 1));
    assert_eq!(payload.disconnecting[0].position, position);
    assert!(game.snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unregister_unknown_session_is_quiet() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    hub.register(a).await.unwrap();
    settle(&hub).await;
    drain(&mut rx_a);

    hub.unregister(sid("ghost")).await.unwrap();
    settle(&hub).await;

    assert!(drain(&mut rx_a).is_empty());
}

// =========================================================================
// announce / lookup
// =========================================================================

#[tokio::test]
async fn test_announce_rebroadcasts_presence_under_given_kind() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    hub.register(a).await.unwrap();
    settle(&hub).await;
    drain(&mut rx_a);

    hub.announce(PresenceKind::Disconnect, sid("a")).await.unwrap();
    settle(&hub).await;

    assert_eq!(
        drain(&mut rx_a),
        vec![ServerEvent::Disconnect(PresencePayload {
            client_id: sid("a"),
            users: vec![summary("a", 1)],
        })]
    );
}

#[tokio::test]
async fn test_lookup_resolves_registered_sessions_only() {
    let (hub, _game) = start();
    let (a, _rx_a) = client("a", 1, 16);
    hub.register(a).await.unwrap();

    assert_eq!(hub.lookup(sid("a")).await.unwrap(), Some(summary("a", 1)));
    assert_eq!(hub.lookup(sid("zzz")).await.unwrap(), None);
}

// =========================================================================
// routing
// =========================================================================

#[tokio::test]
async fn test_unicast_reaches_only_target() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    let (b, mut rx_b) = client("b", 2, 16);
    hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();
    settle(&hub).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    hub.unicast(sid("b"), move_event(1)).await.unwrap();
    hub.unicast(sid("nobody"), move_event(2)).await.unwrap();
    settle(&hub).await;

    assert!(drain(&mut rx_a).is_empty());
    assert_eq!(drain(&mut rx_b), vec![move_event(1)]);
}

#[tokio::test]
async fn test_broadcast_except_skips_excluded_session() {
    let (hub, _game) = start();
    let (a, mut rx_a) = client("a", 1, 16);
    let (b, mut rx_b) = client("b", 2, 16);
    hub.register(a).await.unwrap();
    hub.register(b).await.unwrap();
    settle(&hub).await;
    drain(&mut rx_a);
    drain(&mut rx_b);

    hub.broadcast_except(sid("a"), move_event(3)).await.unwrap();
    hub.broadcast(move_event(4)).await.unwrap();
    settle(&hub).await;

    assert_eq!(drain(&mut rx_a), vec![move_event(4)]);
    assert_eq!(drain(&mut rx_b), vec![move_event(3), move_event(4)]);
}

#[tokio::test]
async fn test_full_queue_evicts_without_blocking_sender() {
    let (hub, _game) = start();
    // Capacity 1: the session's own join fills the queue.
    let (slow, mut rx_slow) = client("slow", 1, 1);
    let (fast, mut rx_fast) = client("fast", 2, 64);
    hub.register(slow).await.unwrap();
    hub.register(fast).await.unwrap();

    for n in 0..10 {
        hub.broadcast(move_event(n)).await.unwrap();
    }
    settle(&hub).await;

    assert_eq!(hub.presence().await.unwrap(), vec![summary("fast", 2)]);
    // Its own join plus the ten broadcasts.
    assert_eq!(drain(&mut rx_fast).len(), 11);
    // The one queued join is still readable, then the queue is closed.
    assert_eq!(drain(&mut rx_slow).len(), 1);
    assert_eq!(rx_slow.try_recv(), Err(TryRecvError::Disconnected));
}
