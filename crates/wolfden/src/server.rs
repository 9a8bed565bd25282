//! Server builder and accept loop.
//!
//! Ties the layers together: transport → protocol → hub → room. One task
//! per accepted connection.

use std::sync::Arc;

use wolfden_protocol::JsonCodec;
use wolfden_room::RoomRegistry;
use wolfden_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::WolfdenError;

/// Builder for configuring and starting a Wolfden server.
pub struct WolfdenServerBuilder {
    bind_addr: String,
}

impl WolfdenServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and assembles the server.
    pub async fn build(self) -> Result<WolfdenServer, WolfdenError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(WolfdenServer {
            transport,
            registry: Arc::new(RoomRegistry::new()),
            codec: JsonCodec,
        })
    }
}

impl Default for WolfdenServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Wolfden server. Call [`run`](Self::run) to start accepting.
pub struct WolfdenServer {
    transport: WebSocketTransport,
    registry: Arc<RoomRegistry>,
    codec: JsonCodec,
}

impl WolfdenServer {
    /// Creates a new builder.
    pub fn builder() -> WolfdenServerBuilder {
        WolfdenServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns a handle to the room registry (useful for inspection).
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.registry)
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection gets its own handler task; a handler
    /// failing or a client misbehaving never takes the loop down.
    pub async fn run(mut self) -> Result<(), WolfdenError> {
        tracing::info!("Wolfden server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let registry = Arc::clone(&self.registry);
                    let codec = self.codec;
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, registry, codec).await
                        {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
