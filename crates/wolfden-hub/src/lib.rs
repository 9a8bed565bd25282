//! The per-connection session coordinator for Wolfden.
//!
//! One [`GameHub`] exists per connected client. It translates the client's
//! calls into room mutations and broadcast fan-out, and it is the single
//! place where the cross-cutting rules are enforced: join before acting,
//! at most one room at a time, host-only game start.

mod error;
mod hub;

pub use error::HubError;
pub use hub::GameHub;
