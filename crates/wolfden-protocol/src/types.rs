//! Message types for Wolfden's wire format.
//!
//! Everything here is what actually crosses the network: client requests,
//! server events, and the replicated per-player record. JSON shapes are
//! pinned by the serde attributes and verified by the tests at the bottom —
//! a mismatch means deployed clients stop parsing us.

use serde::{Deserialize, Serialize};
use wolfden_transport::ConnectionId;

// ---------------------------------------------------------------------------
// Math types
// ---------------------------------------------------------------------------

/// A 3D position or direction, as reported by clients.
///
/// The server never interprets these values — positions are trusted
/// client state that gets relayed to the rest of the room.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Integer world dimensions passed along with a game start.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct GridSize {
    pub x: i32,
    pub y: i32,
}

impl GridSize {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

/// Replicated per-player state, visible to every member of a room.
///
/// Owned by the room that contains it, keyed by the owning connection's id.
/// Only the owning connection's handlers mutate it, with one exception:
/// `is_host` is decided once, at join time, by the room itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Display name chosen by the client at join time.
    pub name: String,
    /// The owning connection's id; doubles as the player's identity.
    pub id: ConnectionId,
    /// Last client-reported position. Last write wins.
    pub position: Vec3,
    /// Whether this member holds host authority.
    pub is_host: bool,
    /// Whether this player has volunteered for the monster role.
    pub wants_monster: bool,
}

impl PlayerRecord {
    /// Builds a fresh record for a newly joining player.
    ///
    /// Host status starts false; the room flips it if this turns out to be
    /// the first member.
    pub fn new(name: impl Into<String>, id: ConnectionId) -> Self {
        Self {
            name: name.into(),
            id,
            position: Vec3::default(),
            is_host: false,
            wants_monster: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ClientRequest — one variant per client → server call
// ---------------------------------------------------------------------------

/// A call from a client to the server.
///
/// Internally tagged so the JSON reads
/// `{ "type": "Join", "room": "lobby1", "user": "Alice" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Enter the named room, creating it if it doesn't exist yet.
    Join { room: String, user: String },

    /// Leave the current room.
    Leave,

    /// Host only: start the match. A non-host caller is silently removed
    /// from the room instead (see the hub).
    StartGame { seed: u32, world_size: GridSize },

    /// The client finished loading the level.
    GameLoaded,

    /// Lobby/room chat.
    SendMessage { text: String },

    /// Client-reported position update.
    UpdatePosition { position: Vec3 },

    /// The player jumped.
    Jump { force: Vec3, start_speed: f32 },

    /// The player started or stopped crouching.
    Crouch { is_crouching: bool },

    /// The player used an ability.
    UseAbility { ability_id: i32 },

    /// The player claims to have hit `target`. Not validated server-side.
    HitPlayer { target: PlayerRecord, direction: Vec3 },

    /// Volunteer (or withdraw) for the monster role. Delivered to the host
    /// only, not the whole room.
    ToggleMonster { wants: bool },
}

// ---------------------------------------------------------------------------
// GameEvent — one variant per server → client push
// ---------------------------------------------------------------------------

/// An event pushed from the server to room members.
///
/// One variant per entry in the receiver surface. `PlayerDied` is part of
/// the client-facing surface but is never produced by a request handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A new player entered the room.
    Joined { player: PlayerRecord },

    /// A player left the room (or disconnected).
    Left { player: PlayerRecord },

    /// The full roster in join order, sent to a player right after joining.
    LobbySnapshot { players: Vec<PlayerRecord> },

    /// The host started the match.
    GameStarted { seed: u32, world_size: GridSize },

    /// A player finished loading.
    PlayerLoaded { player: PlayerRecord },

    /// Chat from another member.
    Chat { player: PlayerRecord, text: String },

    /// Another member moved.
    PositionChanged { player: PlayerRecord },

    /// Another member jumped.
    Jumped {
        player: PlayerRecord,
        force: Vec3,
        start_speed: f32,
    },

    /// Another member crouched or stood up.
    Crouched {
        player: PlayerRecord,
        is_crouching: bool,
    },

    /// Another member used an ability.
    AbilityUsed {
        player: PlayerRecord,
        ability_id: i32,
    },

    /// A member was hit.
    PlayerHit {
        player: PlayerRecord,
        direction: Vec3,
    },

    /// A member died.
    PlayerDied { player: PlayerRecord },

    /// A member changed their monster-role vote. Host-only delivery.
    MonsterWantChanged {
        player: PlayerRecord,
        wants: bool,
    },
}

// ---------------------------------------------------------------------------
// Payload and Envelope
// ---------------------------------------------------------------------------

/// The content of an envelope, in either direction.
///
/// Adjacently tagged: `{ "type": "Request", "data": { ... } }`. The nested
/// enums carry their own `type` tag, so the two levels answer different
/// questions — "what kind of traffic is this" and then "which call/event".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    // -- Connection establishment --
    /// Client → server: first message on a fresh connection.
    Hello { version: u32 },

    /// Server → client: connection accepted, here is your identity.
    Welcome { player_id: ConnectionId },

    // -- Keep-alive --
    /// Client → server: liveness probe.
    Ping { client_time: u64 },

    /// Server → client: probe echo with server timing.
    Pong { client_time: u64, server_time: u64 },

    // -- Calls and replies --
    /// Client → server: a gameplay call.
    Request(ClientRequest),

    /// Server → client: reply to `Join` — the roster in join order,
    /// including the caller.
    Roster { players: Vec<PlayerRecord> },

    /// Server → client: the call succeeded and has no payload.
    Ack,

    /// Server → client: the call failed. `code` follows HTTP conventions.
    Error { code: u16, message: String },

    // -- Pushes --
    /// Server → client: a room event.
    Event(GameEvent),
}

/// Top-level wrapper for every message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender auto-incrementing sequence number.
    pub seq: u64,

    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,

    /// The actual content.
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
