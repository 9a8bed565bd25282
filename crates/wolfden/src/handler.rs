//! Per-connection handler: handshake, request dispatch, and the event pump.
//!
//! Each accepted connection runs this in its own task:
//!
//! 1. `Hello` → version check → `Welcome` carrying the server-issued id
//! 2. A pump task drains the connection's event channel onto the socket
//! 3. Loop: decode envelopes, dispatch requests to the [`GameHub`], reply
//! 4. Close/timeout/error → disconnect cleanup, identical to `Leave`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use wolfden_hub::{GameHub, HubError};
use wolfden_protocol::{
    ClientRequest, Codec, Envelope, JsonCodec, Payload, ProtocolError,
    PROTOCOL_VERSION,
};
use wolfden_room::RoomRegistry;
use wolfden_transport::{Connection, WebSocketConnection};

use crate::WolfdenError;

/// How long a fresh connection has to present its `Hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle cutoff for established connections. Clients are expected to `Ping`
/// well inside this window; silence is treated as a disconnect.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Shared outbound side of one connection.
///
/// Both the request loop and the event pump write through this, so they
/// share one sequence counter and the socket stays a single ordered stream
/// of envelopes.
#[derive(Clone)]
struct Outbox {
    conn: WebSocketConnection,
    codec: JsonCodec,
    seq: Arc<AtomicU64>,
    start: Instant,
}

impl Outbox {
    async fn send(&self, payload: Payload) -> Result<(), WolfdenError> {
        let envelope = Envelope {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            timestamp: self.now(),
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    registry: Arc<RoomRegistry>,
    codec: JsonCodec,
) -> Result<(), WolfdenError> {
    let player_id = conn.id();
    let outbox = Outbox {
        conn: conn.clone(),
        codec,
        seq: Arc::new(AtomicU64::new(0)),
        start: Instant::now(),
    };

    perform_handshake(&conn, &outbox).await?;
    tracing::info!(%player_id, "client connected");

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut hub = GameHub::new(player_id, registry, event_tx);

    // Event pump: room events flow onto the socket even while the request
    // loop is blocked inside a handler.
    let pump_outbox = outbox.clone();
    let pump = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if pump_outbox.send(Payload::Event(event)).await.is_err() {
                break;
            }
        }
    });

    loop {
        let data =
            match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
                Ok(Ok(Some(data))) => data,
                Ok(Ok(None)) => {
                    tracing::info!(%player_id, "connection closed cleanly");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::debug!(%player_id, error = %e, "recv error");
                    break;
                }
                Err(_) => {
                    tracing::info!(%player_id, "connection timed out");
                    break;
                }
            };

        let envelope: Envelope = match codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable envelope");
                continue;
            }
        };

        let reply = match envelope.payload {
            Payload::Ping { client_time } => Payload::Pong {
                client_time,
                server_time: outbox.now(),
            },
            Payload::Request(req) => dispatch(&mut hub, req).await,
            other => {
                tracing::debug!(
                    %player_id,
                    payload = ?other,
                    "ignoring unexpected payload"
                );
                continue;
            }
        };

        if outbox.send(reply).await.is_err() {
            break;
        }
    }

    // Abrupt or clean, every exit path runs the same leave semantics.
    hub.on_disconnect().await;
    drop(hub); // closes the event channel so the pump drains and exits
    let _ = pump.await;
    let _ = conn.close().await;
    Ok(())
}

/// Receives the `Hello`, checks the version, and sends the `Welcome` that
/// hands the client its connection identity.
async fn perform_handshake(
    conn: &WebSocketConnection,
    outbox: &Outbox,
) -> Result<(), WolfdenError> {
    let data =
        match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ProtocolError::InvalidMessage(
                    "connection closed before handshake".into(),
                )
                .into());
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "handshake timed out".into(),
                )
                .into());
            }
        };

    let envelope: Envelope = outbox.codec.decode(&data)?;
    let version = match envelope.payload {
        Payload::Hello { version } => version,
        _ => {
            outbox
                .send(Payload::Error {
                    code: 400,
                    message: "expected Hello".into(),
                })
                .await?;
            return Err(ProtocolError::InvalidMessage(
                "first message must be Hello".into(),
            )
            .into());
        }
    };

    if version != PROTOCOL_VERSION {
        outbox
            .send(Payload::Error {
                code: 400,
                message: format!(
                    "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
                ),
            })
            .await?;
        return Err(ProtocolError::InvalidMessage(
            "protocol version mismatch".into(),
        )
        .into());
    }

    outbox
        .send(Payload::Welcome {
            player_id: conn.id(),
        })
        .await
}

/// Routes one request to its hub handler and shapes the reply.
async fn dispatch(hub: &mut GameHub, req: ClientRequest) -> Payload {
    use ClientRequest::*;

    let result = match req {
        Join { room, user } => {
            return match hub.join(&room, &user).await {
                Ok(players) => Payload::Roster { players },
                Err(e) => error_payload(e),
            };
        }
        Leave => hub.leave().await,
        StartGame { seed, world_size } => {
            hub.start_game(seed, world_size).await
        }
        GameLoaded => hub.game_loaded().await,
        SendMessage { text } => hub.send_message(&text).await,
        UpdatePosition { position } => hub.update_position(position).await,
        Jump { force, start_speed } => hub.jump(force, start_speed).await,
        Crouch { is_crouching } => hub.crouch(is_crouching).await,
        UseAbility { ability_id } => hub.use_ability(ability_id).await,
        HitPlayer { target, direction } => {
            hub.hit_player(target, direction).await
        }
        ToggleMonster { wants } => hub.toggle_monster(wants).await,
    };

    match result {
        Ok(()) => Payload::Ack,
        Err(e) => error_payload(e),
    }
}

fn error_payload(err: HubError) -> Payload {
    let code = match err {
        HubError::AlreadyInRoom => 409,
        HubError::NotInRoom | HubError::MalformedRequest(_) => 400,
    };
    Payload::Error {
        code,
        message: err.to_string(),
    }
}
