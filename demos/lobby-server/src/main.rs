//! Runnable lobby server: binds the Wolfden stack to a socket and serves
//! rooms until killed. `WOLFDEN_ADDR` overrides the bind address,
//! `RUST_LOG` controls log verbosity.

use wolfden::{WolfdenError, WolfdenServer};

#[tokio::main]
async fn main() -> Result<(), WolfdenError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("WOLFDEN_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    tracing::info!(%addr, "starting lobby server");
    let server = WolfdenServer::builder().bind(&addr).build().await?;
    server.run().await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;
    use wolfden::{
        ClientRequest, Envelope, GameEvent, Payload, WolfdenServer,
        PROTOCOL_VERSION,
    };

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = WolfdenServer::builder()
            .bind("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn ws(addr: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws
    }

    fn enc(payload: Payload) -> Message {
        let env = Envelope {
            seq: 0,
            timestamp: 0,
            payload,
        };
        Message::Binary(serde_json::to_vec(&env).unwrap().into())
    }

    async fn recv(ws: &mut Ws) -> Payload {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        let env: Envelope = serde_json::from_slice(&msg.into_data()).unwrap();
        env.payload
    }

    /// Connect, handshake, and join `den` under `name`; drains the Roster
    /// reply and LobbySnapshot push.
    async fn player(addr: &str, name: &str) -> Ws {
        let mut ws = ws(addr).await;
        ws.send(enc(Payload::Hello {
            version: PROTOCOL_VERSION,
        }))
        .await
        .unwrap();
        let _ = recv(&mut ws).await; // Welcome

        ws.send(enc(Payload::Request(ClientRequest::Join {
            room: "den".into(),
            user: name.into(),
        })))
        .await
        .unwrap();
        let _ = recv(&mut ws).await; // Roster or LobbySnapshot
        let _ = recv(&mut ws).await; // the other one
        ws
    }

    #[tokio::test]
    async fn test_monster_vote_reaches_host_only() {
        let addr = start().await;

        let mut host = player(&addr, "Alice").await;
        let mut bob = player(&addr, "Bob").await;
        let _ = recv(&mut host).await; // Bob's Joined
        let mut carol = player(&addr, "Carol").await;
        let _ = recv(&mut host).await; // Carol's Joined
        let _ = recv(&mut bob).await;

        carol
            .send(enc(Payload::Request(ClientRequest::ToggleMonster {
                wants: true,
            })))
            .await
            .unwrap();
        assert!(matches!(recv(&mut carol).await, Payload::Ack));

        // Only the host hears about the vote.
        match recv(&mut host).await {
            Payload::Event(GameEvent::MonsterWantChanged {
                player,
                wants,
            }) => {
                assert_eq!(player.name, "Carol");
                assert!(wants);
            }
            other => panic!("expected MonsterWantChanged, got {other:?}"),
        }

        // Bob sees nothing; a chat from Alice is the next thing he gets.
        host.send(enc(Payload::Request(ClientRequest::SendMessage {
            text: "ready?".into(),
        })))
        .await
        .unwrap();
        match recv(&mut bob).await {
            Payload::Event(GameEvent::Chat { text, .. }) => {
                assert_eq!(text, "ready?");
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_host_start_is_a_silent_kick() {
        let addr = start().await;

        let mut host = player(&addr, "Alice").await;
        let mut bob = player(&addr, "Bob").await;
        let _ = recv(&mut host).await; // Bob's Joined

        bob.send(enc(Payload::Request(ClientRequest::StartGame {
            seed: 7,
            world_size: wolfden::GridSize::new(32, 32),
        })))
        .await
        .unwrap();

        // The call reports success even though Bob was removed.
        assert!(matches!(recv(&mut bob).await, Payload::Ack));

        // No GameStarted and no Left reaches the host; the next thing
        // Alice hears is Bob rejoining.
        let bob2 = player(&addr, "Bob").await;
        match recv(&mut host).await {
            Payload::Event(GameEvent::Joined { player }) => {
                assert_eq!(player.name, "Bob");
            }
            other => panic!("expected Joined, got {other:?}"),
        }
        drop(bob2);
    }
}
