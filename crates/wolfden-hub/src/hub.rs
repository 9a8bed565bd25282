//! `GameHub`: request handlers for one connection.
//!
//! Every handler runs in the context of exactly one connection. The hub
//! threads that context explicitly — connection id, current room, and the
//! caller's own event channel — instead of looking anything up ambiently.
//! Handlers only ever mutate the record owned by their own connection;
//! kicking or editing other players is not part of this protocol.

use std::sync::Arc;

use wolfden_protocol::{ConnectionId, GameEvent, GridSize, PlayerRecord, Vec3};
use wolfden_room::{fanout, EventSender, Peer, RoomRegistry};

use crate::HubError;

/// The session coordinator bound to one connection.
pub struct GameHub {
    id: ConnectionId,
    registry: Arc<RoomRegistry>,
    /// Channel into this connection's own event pump (`to_caller` target).
    events: EventSender,
    /// Name of the room this connection is currently in.
    room: Option<String>,
}

impl GameHub {
    /// Creates a hub for a freshly established connection.
    pub fn new(
        id: ConnectionId,
        registry: Arc<RoomRegistry>,
        events: EventSender,
    ) -> Self {
        Self {
            id,
            registry,
            events,
            room: None,
        }
    }

    /// This connection's id (and player identity).
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// The room this connection is currently in, if any.
    pub fn current_room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    /// Enters `room`, creating it on demand.
    ///
    /// Replies with the ordered roster (including the caller), pushes a
    /// `LobbySnapshot` to the caller, and announces the join to everyone
    /// else. The first member of a fresh room becomes its host.
    pub async fn join(
        &mut self,
        room: &str,
        user: &str,
    ) -> Result<Vec<PlayerRecord>, HubError> {
        if self.room.is_some() {
            return Err(HubError::AlreadyInRoom);
        }
        if room.trim().is_empty() {
            return Err(HubError::MalformedRequest("room name is empty"));
        }
        if user.trim().is_empty() {
            return Err(HubError::MalformedRequest("user name is empty"));
        }

        let record = PlayerRecord::new(user, self.id);
        let outcome = self
            .registry
            .join(room, record, self.events.clone())
            .await?;
        self.room = Some(room.to_string());

        tracing::info!(
            player = %self.id,
            name = user,
            room,
            is_host = outcome.record.is_host,
            "joined room"
        );

        fanout::to_caller(
            &self.events,
            GameEvent::LobbySnapshot {
                players: outcome.roster.clone(),
            },
        );
        fanout::to_all_except(
            &outcome.peers,
            self.id,
            &GameEvent::Joined {
                player: outcome.record,
            },
        );

        Ok(outcome.roster)
    }

    /// Leaves the current room and announces the departure to the members
    /// that remain. The broadcast fires after the removal, so the departing
    /// member never hears its own leave.
    pub async fn leave(&mut self) -> Result<(), HubError> {
        let room = self.room.take().ok_or(HubError::NotInRoom)?;
        let outcome = self.registry.leave(&room, self.id).await?;

        tracing::info!(player = %self.id, room, "left room");

        fanout::to_all(
            &outcome.remaining,
            &GameEvent::Left {
                player: outcome.record,
            },
        );
        Ok(())
    }

    /// Treats an abrupt disconnect exactly like an explicit leave.
    ///
    /// Safe to call unconditionally: a connection that already left (or
    /// never joined) is a no-op, so leave-then-disconnect cannot
    /// double-remove or double-broadcast.
    pub async fn on_disconnect(&mut self) {
        match self.leave().await {
            Ok(()) => {}
            Err(HubError::NotInRoom) => {}
            Err(e) => {
                tracing::debug!(player = %self.id, error = %e, "disconnect cleanup");
            }
        }
    }

    /// Announces that this client finished loading the level.
    pub async fn game_loaded(&self) -> Result<(), HubError> {
        let (me, peers) = self.context().await?;
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::PlayerLoaded { player: me },
        );
        Ok(())
    }

    /// Relays a chat message to the rest of the room.
    pub async fn send_message(&self, text: &str) -> Result<(), HubError> {
        let (me, peers) = self.context().await?;
        tracing::debug!(player = %me.name, text, "chat");
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::Chat {
                player: me,
                text: text.to_string(),
            },
        );
        Ok(())
    }

    /// Stores the client-reported position and relays it. Last write wins;
    /// the server does not validate movement.
    pub async fn update_position(&self, position: Vec3) -> Result<(), HubError> {
        let room = self.room.as_deref().ok_or(HubError::NotInRoom)?;
        let (record, peers) = self
            .registry
            .update_position(room, self.id, position)
            .await?;
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::PositionChanged { player: record },
        );
        Ok(())
    }

    /// Relays a jump.
    pub async fn jump(
        &self,
        force: Vec3,
        start_speed: f32,
    ) -> Result<(), HubError> {
        let (me, peers) = self.context().await?;
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::Jumped {
                player: me,
                force,
                start_speed,
            },
        );
        Ok(())
    }

    /// Relays a crouch state change.
    pub async fn crouch(&self, is_crouching: bool) -> Result<(), HubError> {
        let (me, peers) = self.context().await?;
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::Crouched {
                player: me,
                is_crouching,
            },
        );
        Ok(())
    }

    /// Relays an ability use.
    pub async fn use_ability(&self, ability_id: i32) -> Result<(), HubError> {
        let (me, peers) = self.context().await?;
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::AbilityUsed {
                player: me,
                ability_id,
            },
        );
        Ok(())
    }

    /// Relays a claimed hit on `target`. The hit is not validated; the
    /// event carries the target's record as reported by the caller.
    pub async fn hit_player(
        &self,
        target: PlayerRecord,
        direction: Vec3,
    ) -> Result<(), HubError> {
        let (_, peers) = self.context().await?;
        tracing::debug!(target = %target.name, "player hit");
        fanout::to_all_except(
            &peers,
            self.id,
            &GameEvent::PlayerHit {
                player: target,
                direction,
            },
        );
        Ok(())
    }

    /// Records the caller's monster-role vote and notifies the host only.
    ///
    /// If the room currently has no host (the host left and nobody was
    /// promoted), the vote is stored and the notification is dropped.
    pub async fn toggle_monster(&self, wants: bool) -> Result<(), HubError> {
        let room = self.room.as_deref().ok_or(HubError::NotInRoom)?;
        let (record, peers, host_id) = self
            .registry
            .set_wants_monster(room, self.id, wants)
            .await?;

        match host_id {
            Some(host_id) => {
                fanout::to_one(
                    &peers,
                    host_id,
                    GameEvent::MonsterWantChanged {
                        player: record,
                        wants,
                    },
                );
            }
            None => {
                tracing::debug!(
                    player = %self.id,
                    room,
                    "monster vote stored, room has no host to notify"
                );
            }
        }
        Ok(())
    }

    /// Starts the match — host only.
    ///
    /// A non-host caller is removed from the room with no broadcast of any
    /// kind: not a rejection, not a leave event. This silent kick is
    /// long-standing protocol behavior that clients rely on.
    pub async fn start_game(
        &mut self,
        seed: u32,
        world_size: GridSize,
    ) -> Result<(), HubError> {
        let room = self.room.clone().ok_or(HubError::NotInRoom)?;
        let (me, peers) = self.registry.member_context(&room, self.id).await?;

        if me.is_host {
            tracing::info!(
                player = %me.name,
                room,
                seed,
                players = peers.len(),
                "game started"
            );
            fanout::to_all(&peers, &GameEvent::GameStarted { seed, world_size });
        } else {
            tracing::warn!(
                player = %me.name,
                room,
                "non-host tried to start the game, kicking"
            );
            let _ = self.registry.leave(&room, self.id).await;
            self.room = None;
        }
        Ok(())
    }

    /// Membership check plus the snapshots every relaying handler needs.
    async fn context(&self) -> Result<(PlayerRecord, Vec<Peer>), HubError> {
        let room = self.room.as_deref().ok_or(HubError::NotInRoom)?;
        Ok(self.registry.member_context(room, self.id).await?)
    }
}
