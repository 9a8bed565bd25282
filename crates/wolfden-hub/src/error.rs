//! Error types for the session coordinator.

use wolfden_room::RoomError;

/// Errors reported back to the calling connection.
///
/// These never fan out to other members; a failed call is visible only to
/// its caller.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A room-scoped call arrived before `join` (or after `leave`).
    #[error("not in a room")]
    NotInRoom,

    /// `join` was called while already in a room.
    #[error("already in a room")]
    AlreadyInRoom,

    /// The request failed basic validation before touching any state.
    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),
}

impl From<RoomError> for HubError {
    /// Internal membership errors surface to the client as the coarser
    /// session-level errors; inconsistent internal state (a record missing
    /// for a connection believed to be a member) reads as `NotInRoom`
    /// rather than a crash.
    fn from(err: RoomError) -> Self {
        match err {
            RoomError::AlreadyMember(..) => HubError::AlreadyInRoom,
            RoomError::NotAMember(..) => HubError::NotInRoom,
        }
    }
}
