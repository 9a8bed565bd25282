//! Broadcast fan-out: deliver one event to a computed subset of a room.
//!
//! Every function takes a snapshot of peers captured under the registry
//! lock and delivers without blocking: sends go into each member's
//! unbounded channel and a closed channel (member mid-disconnect) is
//! logged and skipped, never aborting delivery to the rest.

use wolfden_protocol::{ConnectionId, GameEvent};

use crate::room::{EventSender, Peer};

/// Delivers `event` to every peer in the snapshot.
pub fn to_all(peers: &[Peer], event: &GameEvent) {
    for peer in peers {
        deliver(peer, event.clone());
    }
}

/// Delivers `event` to every peer except `excluded`.
///
/// Used for echo suppression: the mutating member gets its confirmation as
/// a direct reply instead of hearing its own broadcast.
pub fn to_all_except(
    peers: &[Peer],
    excluded: ConnectionId,
    event: &GameEvent,
) {
    for peer in peers.iter().filter(|p| p.id != excluded) {
        deliver(peer, event.clone());
    }
}

/// Delivers `event` to `target` only.
///
/// A target that is no longer in the snapshot is expected (leave racing an
/// in-flight message) and simply logged.
pub fn to_one(peers: &[Peer], target: ConnectionId, event: GameEvent) {
    match peers.iter().find(|p| p.id == target) {
        Some(peer) => deliver(peer, event),
        None => {
            tracing::debug!(%target, "targeted event dropped: recipient gone");
        }
    }
}

/// Delivers `event` to the requesting connection itself.
pub fn to_caller(sender: &EventSender, event: GameEvent) {
    if sender.send(event).is_err() {
        tracing::debug!("caller event dropped: connection task gone");
    }
}

fn deliver(peer: &Peer, event: GameEvent) {
    if peer.sender.send(event).is_err() {
        tracing::debug!(player = %peer.id, "event dropped: receiver closed");
    }
}
