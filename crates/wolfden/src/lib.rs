//! # Wolfden
//!
//! Server-side coordination core for a small real-time multiplayer game:
//! clients connect over WebSocket, join named rooms, and exchange
//! low-latency gameplay events. The first member of a room becomes its
//! host; events fan out to the whole room, everyone but the sender, or one
//! targeted member.
//!
//! ```rust,no_run
//! use wolfden::WolfdenServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wolfden::WolfdenError> {
//!     let server = WolfdenServer::builder()
//!         .bind("0.0.0.0:3000")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::WolfdenError;
pub use server::{WolfdenServer, WolfdenServerBuilder};

pub use wolfden_hub::{GameHub, HubError};
pub use wolfden_protocol::{
    ClientRequest, Envelope, GameEvent, GridSize, Payload, PlayerRecord,
    Vec3, PROTOCOL_VERSION,
};
pub use wolfden_room::RoomRegistry;
pub use wolfden_transport::ConnectionId;
