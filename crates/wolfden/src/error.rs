//! Unified error type for the Wolfden server.

use wolfden_hub::HubError;
use wolfden_protocol::ProtocolError;
use wolfden_room::RoomError;
use wolfden_transport::TransportError;

/// Top-level error wrapping every layer's error type.
///
/// Callers of the meta crate deal with this single type; `#[from]` lets
/// `?` lift sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WolfdenError {
    /// Connection-level failure (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode/decode or protocol-rule failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Session-coordinator failure (precondition violations).
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Room membership failure.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_errors_lift_into_the_unified_type() {
        let err: WolfdenError =
            TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, WolfdenError::Transport(_)));
        assert!(err.to_string().contains("gone"));

        let err: WolfdenError =
            ProtocolError::InvalidMessage("bad hello".into()).into();
        assert!(matches!(err, WolfdenError::Protocol(_)));

        let err: WolfdenError = HubError::NotInRoom.into();
        assert!(matches!(err, WolfdenError::Hub(_)));
    }
}
