//! Error types for the room layer.

use wolfden_protocol::ConnectionId;

/// Errors that can occur during room membership operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The connection is already registered in this room.
    #[error("connection {0} is already a member of room {1:?}")]
    AlreadyMember(ConnectionId, String),

    /// The connection is not a member of this room (or the room is gone).
    #[error("connection {0} is not a member of room {1:?}")]
    NotAMember(ConnectionId, String),
}
