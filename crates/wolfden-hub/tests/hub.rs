//! Integration tests for the session coordinator: the full request surface
//! driven against a shared registry, with each client's event channel
//! standing in for its connection.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use wolfden_hub::{GameHub, HubError};
use wolfden_protocol::{
    ConnectionId, GameEvent, GridSize, PlayerRecord, Vec3,
};
use wolfden_room::RoomRegistry;

fn client(registry: &Arc<RoomRegistry>) -> (GameHub, UnboundedReceiver<GameEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let hub = GameHub::new(ConnectionId::generate(), Arc::clone(registry), tx);
    (hub, rx)
}

/// Collects everything currently queued on a client's event channel.
fn drain(rx: &mut UnboundedReceiver<GameEvent>) -> Vec<GameEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

// =========================================================================
// Scenario A: join order, roster replies, and join broadcasts
// =========================================================================

#[tokio::test]
async fn join_replies_with_roster_and_announces_to_others() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    let roster = alice.join("lobby1", "Alice").await.unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].name, "Alice");
    assert!(roster[0].is_host);

    // Alice gets her lobby snapshot and no join echo for herself.
    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::LobbySnapshot { players } if players.len() == 1));

    let roster = bob.join("lobby1", "Bob").await.unwrap();
    let names: Vec<_> = roster.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Alice", "Bob"]);
    assert!(!roster[1].is_host);

    // Alice (not Bob) receives the join broadcast for Bob.
    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::Joined { player } if player.name == "Bob"));

    let events = drain(&mut rx_bob);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::LobbySnapshot { players } if players.len() == 2));
}

#[tokio::test]
async fn rooms_are_isolated_broadcast_domains() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut eve, mut rx_eve) = client(&registry);

    alice.join("den-a", "Alice").await.unwrap();
    eve.join("den-b", "Eve").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_eve);

    eve.send_message("anyone here?").await.unwrap();
    assert!(drain(&mut rx_alice).is_empty(), "no cross-room leakage");
}

// =========================================================================
// Preconditions and validation
// =========================================================================

#[tokio::test]
async fn join_twice_without_leaving_fails() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, _rx) = client(&registry);

    alice.join("lobby1", "Alice").await.unwrap();
    let err = alice.join("lobby2", "Alice").await.unwrap_err();
    assert!(matches!(err, HubError::AlreadyInRoom));

    // The failed call must not have created the second room.
    assert!(!registry.contains("lobby2").await);
}

#[tokio::test]
async fn room_scoped_calls_before_join_fail_with_not_in_room() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut hub, _rx) = client(&registry);

    assert!(matches!(hub.leave().await, Err(HubError::NotInRoom)));
    assert!(matches!(hub.game_loaded().await, Err(HubError::NotInRoom)));
    assert!(matches!(
        hub.send_message("hi").await,
        Err(HubError::NotInRoom)
    ));
    assert!(matches!(
        hub.update_position(Vec3::default()).await,
        Err(HubError::NotInRoom)
    ));
    assert!(matches!(
        hub.toggle_monster(true).await,
        Err(HubError::NotInRoom)
    ));
    assert!(matches!(
        hub.start_game(1, GridSize::new(8, 8)).await,
        Err(HubError::NotInRoom)
    ));
}

#[tokio::test]
async fn empty_names_are_rejected_without_mutating_state() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut hub, _rx) = client(&registry);

    assert!(matches!(
        hub.join("", "Alice").await,
        Err(HubError::MalformedRequest(_))
    ));
    assert!(matches!(
        hub.join("  ", "Alice").await,
        Err(HubError::MalformedRequest(_))
    ));
    assert!(matches!(
        hub.join("lobby1", "").await,
        Err(HubError::MalformedRequest(_))
    ));
    assert_eq!(registry.room_count().await, 0);
    assert!(hub.current_room().is_none());
}

// =========================================================================
// Fan-out exclusion
// =========================================================================

#[tokio::test]
async fn callers_never_receive_their_own_broadcasts() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    bob.join("den", "Bob").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    bob.update_position(Vec3::new(1.0, 0.0, 1.0)).await.unwrap();
    bob.jump(Vec3::new(0.0, 5.0, 0.0), 2.5).await.unwrap();
    bob.crouch(true).await.unwrap();
    bob.use_ability(3).await.unwrap();
    bob.send_message("boo").await.unwrap();
    bob.game_loaded().await.unwrap();

    assert!(drain(&mut rx_bob).is_empty(), "no echo to the caller");

    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 6);
    assert!(matches!(&events[0], GameEvent::PositionChanged { player }
        if player.name == "Bob" && player.position == Vec3::new(1.0, 0.0, 1.0)));
    assert!(matches!(&events[1], GameEvent::Jumped { start_speed, .. } if *start_speed == 2.5));
    assert!(matches!(&events[2], GameEvent::Crouched { is_crouching: true, .. }));
    assert!(matches!(&events[3], GameEvent::AbilityUsed { ability_id: 3, .. }));
    assert!(matches!(&events[4], GameEvent::Chat { text, .. } if text == "boo"));
    assert!(matches!(&events[5], GameEvent::PlayerLoaded { player } if player.name == "Bob"));
}

#[tokio::test]
async fn hit_player_relays_the_reported_target() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    let roster = bob.join("den", "Bob").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    let target: PlayerRecord = roster[0].clone(); // Alice, as Bob sees her
    bob.hit_player(target, Vec3::new(0.0, 0.0, -1.0)).await.unwrap();

    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::PlayerHit { player, direction }
        if player.name == "Alice" && direction.z == -1.0));
    assert!(drain(&mut rx_bob).is_empty());
}

// =========================================================================
// Targeted monster-role delivery
// =========================================================================

#[tokio::test]
async fn monster_vote_reaches_only_the_host_in_a_five_member_room() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut host, mut rx_host) = client(&registry);
    host.join("den", "Host").await.unwrap();

    let mut others = Vec::new();
    for name in ["B", "C", "D", "E"] {
        let (mut hub, rx) = client(&registry);
        hub.join("den", name).await.unwrap();
        others.push((hub, rx));
    }
    drain(&mut rx_host);
    for (_, rx) in &mut others {
        drain(rx);
    }

    others[2].0.toggle_monster(true).await.unwrap();

    let events = drain(&mut rx_host);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::MonsterWantChanged { player, wants: true }
        if player.name == "D"));

    for (_, rx) in &mut others {
        assert!(drain(rx).is_empty(), "non-hosts must not see the vote");
    }
}

#[tokio::test]
async fn monster_vote_with_no_host_is_stored_but_notifies_nobody() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, _rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    bob.join("den", "Bob").await.unwrap();
    alice.leave().await.unwrap(); // host gone, nobody promoted
    drain(&mut rx_bob);

    bob.toggle_monster(true).await.unwrap();
    assert!(drain(&mut rx_bob).is_empty());

    let members = registry.members("den").await;
    assert!(members[0].wants_monster, "the vote itself is stored");
}

// =========================================================================
// Leave and disconnect
// =========================================================================

#[tokio::test]
async fn leave_notifies_the_remaining_members_only() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    bob.join("den", "Bob").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    bob.leave().await.unwrap();

    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::Left { player } if player.name == "Bob"));
    assert!(drain(&mut rx_bob).is_empty(), "departed member is not re-notified");
    assert!(bob.current_room().is_none());
}

#[tokio::test]
async fn departure_is_idempotent() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, _rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    bob.join("den", "Bob").await.unwrap();
    drain(&mut rx_alice);

    bob.leave().await.unwrap();
    assert!(matches!(bob.leave().await, Err(HubError::NotInRoom)));

    // Disconnect after an explicit leave: no second removal, no second
    // leave broadcast.
    bob.on_disconnect().await;

    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1, "exactly one leave event for Bob");
}

#[tokio::test]
async fn disconnect_without_prior_leave_behaves_like_leave() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, _rx_bob) = client(&registry);

    alice.join("den", "Alice").await.unwrap();
    bob.join("den", "Bob").await.unwrap();
    drain(&mut rx_alice);

    bob.on_disconnect().await;

    let events = drain(&mut rx_alice);
    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], GameEvent::Left { player } if player.name == "Bob"));
    assert_eq!(registry.members("den").await.len(), 1);
}

// =========================================================================
// Scenarios B and C: start_game
// =========================================================================

#[tokio::test]
async fn host_start_game_reaches_everyone_including_the_host() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("lobby1", "Alice").await.unwrap();
    bob.join("lobby1", "Bob").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    alice.start_game(42, GridSize::new(64, 48)).await.unwrap();

    for rx in [&mut rx_alice, &mut rx_bob] {
        let events = drain(rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], GameEvent::GameStarted { seed: 42, world_size }
            if *world_size == GridSize::new(64, 48)));
    }
}

#[tokio::test]
async fn non_host_start_game_is_a_silent_kick() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut alice, mut rx_alice) = client(&registry);
    let (mut bob, mut rx_bob) = client(&registry);

    alice.join("lobby1", "Alice").await.unwrap();
    bob.join("lobby1", "Bob").await.unwrap();
    drain(&mut rx_alice);
    drain(&mut rx_bob);

    // The call itself reports success; the caller just vanishes from the
    // room with no broadcast at all — no game start, no leave event.
    bob.start_game(42, GridSize::new(64, 48)).await.unwrap();

    assert!(drain(&mut rx_alice).is_empty());
    assert!(drain(&mut rx_bob).is_empty());
    assert!(bob.current_room().is_none());

    let members = registry.members("lobby1").await;
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].name, "Alice");

    // The kicked caller is free to join again.
    let roster = bob.join("lobby1", "Bob").await.unwrap();
    assert_eq!(roster.len(), 2);
}

#[tokio::test]
async fn kick_of_the_last_other_member_still_removes_the_room_when_emptied() {
    let registry = Arc::new(RoomRegistry::new());
    let (mut solo, _rx) = client(&registry);

    solo.join("den", "Solo").await.unwrap();
    // Solo is host, so start_game succeeds; then leave empties the room.
    solo.start_game(7, GridSize::new(8, 8)).await.unwrap();
    solo.leave().await.unwrap();

    assert!(!registry.contains("den").await);
}
