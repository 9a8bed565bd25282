//! A single room: insertion-ordered membership and host election.
//!
//! `Room` is plain data with synchronous methods. All exclusion lives in
//! the [`RoomRegistry`](crate::RoomRegistry), which only touches rooms
//! while holding its lock — so two membership mutations against the same
//! room can never interleave.

use tokio::sync::mpsc;
use wolfden_protocol::{ConnectionId, GameEvent, PlayerRecord};

use crate::RoomError;

/// Channel sender for delivering events to one member's connection task.
pub type EventSender = mpsc::UnboundedSender<GameEvent>;

/// A snapshot of one member's delivery capability.
///
/// Fan-out iterates over `Vec<Peer>` snapshots taken under the registry
/// lock, so delivery itself happens without holding anything.
#[derive(Debug, Clone)]
pub struct Peer {
    /// The member's connection id.
    pub id: ConnectionId,
    /// Channel into the member's connection task.
    pub sender: EventSender,
}

struct Member {
    record: PlayerRecord,
    sender: EventSender,
}

/// One named room and its members, in join order.
pub struct Room {
    name: String,
    members: Vec<Member>,
}

impl Room {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// The room's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current member count.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the room has no members left.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Inserts a member, electing it host if it is the first.
    ///
    /// Returns whether the member was first (and therefore host) and an
    /// ordered snapshot of the roster including the new member.
    pub fn add_member(
        &mut self,
        mut record: PlayerRecord,
        sender: EventSender,
    ) -> Result<(bool, Vec<PlayerRecord>), RoomError> {
        if self.members.iter().any(|m| m.record.id == record.id) {
            return Err(RoomError::AlreadyMember(record.id, self.name.clone()));
        }

        let is_first = self.members.is_empty();
        record.is_host = is_first;
        self.members.push(Member { record, sender });

        Ok((is_first, self.all_members()))
    }

    /// Removes and returns a member's record.
    ///
    /// Never touches the other members' host flags: if the host leaves,
    /// the room simply has no host until it empties out and is recreated.
    pub fn remove_member(
        &mut self,
        id: ConnectionId,
    ) -> Result<PlayerRecord, RoomError> {
        let index = self
            .members
            .iter()
            .position(|m| m.record.id == id)
            .ok_or_else(|| RoomError::NotAMember(id, self.name.clone()))?;
        Ok(self.members.remove(index).record)
    }

    /// Returns a copy of one member's record.
    pub fn get(&self, id: ConnectionId) -> Option<PlayerRecord> {
        self.members
            .iter()
            .find(|m| m.record.id == id)
            .map(|m| m.record.clone())
    }

    pub(crate) fn get_mut(
        &mut self,
        id: ConnectionId,
    ) -> Option<&mut PlayerRecord> {
        self.members
            .iter_mut()
            .find(|m| m.record.id == id)
            .map(|m| &mut m.record)
    }

    /// An ordered snapshot of every member's record.
    pub fn all_members(&self) -> Vec<PlayerRecord> {
        self.members.iter().map(|m| m.record.clone()).collect()
    }

    /// The unique member holding host authority, if any.
    pub fn find_host(&self) -> Option<PlayerRecord> {
        self.members
            .iter()
            .find(|m| m.record.is_host)
            .map(|m| m.record.clone())
    }

    /// A snapshot of every member's delivery capability.
    pub fn peers(&self) -> Vec<Peer> {
        self.members
            .iter()
            .map(|m| Peer {
                id: m.record.id,
                sender: m.sender.clone(),
            })
            .collect()
    }
}
