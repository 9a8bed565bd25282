//! Room membership and broadcast fan-out for Wolfden.
//!
//! A room is an isolated broadcast domain: events published in one room
//! never reach another. This crate owns the two shared mutable resources of
//! the whole server — the room registry (name → room) and each room's
//! membership list — and the fan-out helpers that deliver events to
//! snapshots of a room's members.
//!
//! # Key types
//!
//! - [`Room`] — insertion-ordered membership plus host election
//! - [`RoomRegistry`] — process-wide name → room map with atomic
//!   get-or-create and remove-if-empty
//! - [`Peer`] / [`EventSender`] — the per-member delivery capability
//! - [`fanout`] — all / all-but-one / single-target delivery

mod error;
pub mod fanout;
mod registry;
mod room;

pub use error::RoomError;
pub use registry::{JoinOutcome, LeaveOutcome, RoomRegistry};
pub use room::{EventSender, Peer, Room};
