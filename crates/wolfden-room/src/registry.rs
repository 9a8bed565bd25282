//! The room registry: the process-wide name → room map.
//!
//! Every entry point locks the registry once and performs the whole
//! compound operation under it — get-or-create plus insert on join, remove
//! plus remove-if-empty on leave. That single exclusion is what makes the
//! two racy edges safe: two simultaneous first joins to the same name see
//! exactly one room, and a room emptying out can never strand a stale entry
//! in front of a new join for the same name.
//!
//! The registry is constructor-injected everywhere it is used, so tests get
//! isolated instances instead of a process global.

use std::collections::HashMap;

use tokio::sync::Mutex;
use wolfden_protocol::{ConnectionId, PlayerRecord, Vec3};

use crate::room::{EventSender, Peer, Room};
use crate::RoomError;

/// Result of a successful join.
#[derive(Debug)]
pub struct JoinOutcome {
    /// The caller's record as stored, host flag already decided.
    pub record: PlayerRecord,
    /// Ordered roster including the caller — the join reply.
    pub roster: Vec<PlayerRecord>,
    /// Delivery snapshot of every member including the caller.
    pub peers: Vec<Peer>,
}

/// Result of a successful leave.
#[derive(Debug)]
pub struct LeaveOutcome {
    /// The departed member's record, for the leave broadcast.
    pub record: PlayerRecord,
    /// Delivery snapshot of the members that remain.
    pub remaining: Vec<Peer>,
}

/// Process-wide mapping from room name to [`Room`].
///
/// Rooms are created on first join to an unknown name and removed the
/// moment their last member departs, so a later join to the same name gets
/// a fresh room with a fresh host election.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<String, Room>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `record` to the named room, creating the room if needed.
    ///
    /// The first member of a fresh room is elected host atomically with the
    /// insert, so at most one member ever holds the flag.
    pub async fn join(
        &self,
        room_name: &str,
        record: PlayerRecord,
        sender: EventSender,
    ) -> Result<JoinOutcome, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .entry(room_name.to_string())
            .or_insert_with(|| {
                tracing::info!(room = room_name, "room created");
                Room::new(room_name)
            });

        let id = record.id;
        let (is_first, roster) = room.add_member(record, sender)?;
        let peers = room.peers();

        tracing::info!(
            room = room_name,
            player = %id,
            members = room.len(),
            is_host = is_first,
            "player joined"
        );

        // The caller's stored record is the last roster entry.
        let record = roster
            .last()
            .cloned()
            .expect("roster contains the member just added");

        Ok(JoinOutcome {
            record,
            roster,
            peers,
        })
    }

    /// Removes a member from the named room, dropping the room if it is
    /// now empty.
    pub async fn leave(
        &self,
        room_name: &str,
        id: ConnectionId,
    ) -> Result<LeaveOutcome, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;

        let record = room.remove_member(id)?;
        let remaining = room.peers();

        tracing::info!(
            room = room_name,
            player = %id,
            members = room.len(),
            "player left"
        );

        if room.is_empty() {
            rooms.remove(room_name);
            tracing::info!(room = room_name, "room removed (empty)");
        }

        Ok(LeaveOutcome { record, remaining })
    }

    /// Returns the caller's record together with a delivery snapshot of the
    /// whole room. The common preamble of every room-scoped handler.
    pub async fn member_context(
        &self,
        room_name: &str,
        id: ConnectionId,
    ) -> Result<(PlayerRecord, Vec<Peer>), RoomError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_name)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        let record = room
            .get(id)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        Ok((record, room.peers()))
    }

    /// Updates the caller's position and returns the updated record plus a
    /// delivery snapshot for the broadcast.
    pub async fn update_position(
        &self,
        room_name: &str,
        id: ConnectionId,
        position: Vec3,
    ) -> Result<(PlayerRecord, Vec<Peer>), RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        let record = room
            .get_mut(id)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        record.position = position;
        let record = record.clone();
        Ok((record, room.peers()))
    }

    /// Updates the caller's monster-role vote.
    ///
    /// Returns the updated record, a delivery snapshot of the room, and the
    /// current host's id if the room has one — the caller targets the host
    /// with the notification, never the whole room. In a hostless room
    /// (the host left, nobody was promoted) the vote is still stored but
    /// `None` comes back: no fallback recipient is picked.
    pub async fn set_wants_monster(
        &self,
        room_name: &str,
        id: ConnectionId,
        wants: bool,
    ) -> Result<(PlayerRecord, Vec<Peer>, Option<ConnectionId>), RoomError>
    {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_name)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        let record = room
            .get_mut(id)
            .ok_or_else(|| RoomError::NotAMember(id, room_name.to_string()))?;
        record.wants_monster = wants;
        let record = record.clone();

        let host_id = room.find_host().map(|host| host.id);
        Ok((record, room.peers(), host_id))
    }

    /// Ordered roster snapshot, or empty if the room doesn't exist.
    pub async fn members(&self, room_name: &str) -> Vec<PlayerRecord> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_name)
            .map(|r| r.all_members())
            .unwrap_or_default()
    }

    /// The named room's host, if the room exists and has one.
    pub async fn find_host(&self, room_name: &str) -> Option<PlayerRecord> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_name).and_then(|r| r.find_host())
    }

    /// Whether a room with this name currently exists.
    pub async fn contains(&self, room_name: &str) -> bool {
        self.rooms.lock().await.contains_key(room_name)
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
