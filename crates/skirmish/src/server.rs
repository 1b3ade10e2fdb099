//! `SkirmishServer` builder and accept loop.
//!
//! This is the entry point for running a Skirmish server. It ties the
//! layers together: transport → client actor → dispatcher → hub / game.

use std::net::SocketAddr;
use std::sync::Arc;

use skirmish_game::{GameConfig, GameHandle, KeyValueStore};
use skirmish_hub::{Authenticator, HubConfig, HubHandle};
use skirmish_protocol::JsonCodec;
use skirmish_transport::{Connection, PendingConnection, WebSocketTransport};

use crate::client::{ClientActor, reject};
use crate::{ClientConfig, Dispatcher, SkirmishError};

/// Shared state handed to each connection task.
struct ServerState<A: Authenticator> {
    hub: HubHandle,
    game: GameHandle,
    auth: A,
    client_config: ClientConfig,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn start() -> Result<(), SkirmishError> {
/// let server = SkirmishServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(DevAuthenticator, MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    client_config: ClientConfig,
    game_config: GameConfig,
    hub_config: HubConfig,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            client_config: ClientConfig::default(),
            game_config: GameConfig::default(),
            hub_config: HubConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets per-connection timing and sizing.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Sets the grid and store key.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.game_config = config;
        self
    }

    /// Sets the hub's channel capacity.
    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Binds the listener and starts the game and hub tasks.
    pub async fn build<A, S>(self, auth: A, store: S) -> Result<SkirmishServer<A>, SkirmishError>
    where
        A: Authenticator,
        S: KeyValueStore,
    {
        let transport =
            WebSocketTransport::bind(&self.bind_addr, self.client_config.upgrade_config()).await?;

        let game = GameHandle::spawn(self.game_config, store);
        let hub = HubHandle::spawn(self.hub_config, game.clone());

        let state = Arc::new(ServerState {
            hub,
            game,
            auth,
            client_config: self.client_config,
        });
        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<A: Authenticator> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A>>,
}

impl<A: Authenticator> SkirmishServer<A> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each accepted connection is upgraded, authenticated, and served on
    /// its own task, so a slow handshake never holds up the next accept.
    pub async fn run(self) -> Result<(), SkirmishError> {
        tracing::info!(addr = ?self.local_addr().ok(), "Skirmish server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let peer = pending.peer_addr();
                        if let Err(e) = handle_connection(pending, state).await {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
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

/// Upgrades, authenticates, and serves one connection.
async fn handle_connection<A: Authenticator>(
    pending: PendingConnection,
    state: Arc<ServerState<A>>,
) -> Result<(), SkirmishError> {
    let conn = pending.upgrade().await?;
    let conn_id = conn.id();
    let token = conn.token().unwrap_or_default().to_string();

    let identity = match state.auth.authenticate(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "authentication failed");
            let _ = reject(&conn, &JsonCodec, &e.to_string(), &state.client_config).await;
            return Err(e.into());
        }
    };
    tracing::debug!(%conn_id, user_id = %identity.user_id, "authenticated");

    let dispatcher = Dispatcher::new(state.hub.clone(), state.game.clone());
    ClientActor::new(
        conn,
        state.hub.clone(),
        dispatcher,
        identity,
        state.client_config.clone(),
    )
    .run()
    .await
}
