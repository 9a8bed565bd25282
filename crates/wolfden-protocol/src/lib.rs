//! Wire protocol for Wolfden.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`Payload`], [`ClientRequest`], [`GameEvent`],
//!   [`PlayerRecord`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The protocol layer sits between the transport (raw frames) and the hub
//! (room membership and fan-out). It knows nothing about connections or
//! rooms — only message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientRequest, Envelope, GameEvent, GridSize, Payload, PlayerRecord, Vec3,
};

/// Re-exported so protocol consumers don't need a direct transport dep
/// just to name a player.
pub use wolfden_transport::ConnectionId;

/// The protocol version clients must present in their `Hello`.
pub const PROTOCOL_VERSION: u32 = 1;
