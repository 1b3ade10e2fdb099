//! Hub actor: the one task that owns the [`Registry`].
//!
//! Registration, unregistration, presence queries, and every routed event
//! are commands on a single channel, so they take effect in the order they
//! were sent. Routing never waits on a recipient: each delivery is a
//! `try_send`, and a recipient that can't take it is evicted.

use skirmish_game::GameHandle;
use skirmish_protocol::{
    JoinGamePayload, PresencePayload, ServerEvent, SessionId, UserLocation, UserSummary,
};
use tokio::sync::{mpsc, oneshot};

use crate::{ClientHandle, Delivery, HubError, PresenceKind, Registry};

/// Configuration for the hub task.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the hub's command channel. Callers wait when it is full.
    pub command_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            command_capacity: 256,
        }
    }
}

/// Where a routed event goes.
#[derive(Debug, Clone)]
enum Route {
    One(SessionId),
    All,
    AllExcept(SessionId),
}

enum HubCommand {
    Register {
        client: ClientHandle,
        reply: oneshot::Sender<Result<(), HubError>>,
    },
    Unregister {
        session_id: SessionId,
        reply: oneshot::Sender<()>,
    },
    Announce {
        kind: PresenceKind,
        session_id: SessionId,
    },
    Presence {
        reply: oneshot::Sender<Vec<UserSummary>>,
    },
    Lookup {
        session_id: SessionId,
        reply: oneshot::Sender<Option<UserSummary>>,
    },
    Route {
        route: Route,
        event: ServerEvent,
    },
}

/// Handle to the running hub. Cheap to clone; every connection holds one.
#[derive(Debug, Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl std::fmt::Debug for HubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register { client, .. } => write!(f, "Register({})", client.session_id()),
            Self::Unregister { session_id, .. } => write!(f, "Unregister({session_id})"),
            Self::Announce { kind, session_id } => write!(f, "Announce({kind:?}, {session_id})"),
            Self::Presence { .. } => f.write_str("Presence"),
            Self::Lookup { session_id, .. } => write!(f, "Lookup({session_id})"),
            Self::Route { route, event } => write!(f, "Route({route:?}, {})", event.name()),
        }
    }
}

impl HubHandle {
    /// Spawns the hub task. `game` is told to drop a session's position
    /// when the session unregisters.
    pub fn spawn(config: HubConfig, game: GameHandle) -> Self {
        let (tx, rx) = mpsc::channel(config.command_capacity.max(1));
        let actor = HubActor {
            registry: Registry::new(),
            game,
            receiver: rx,
        };
        tokio::spawn(actor.run());
        Self { sender: tx }
    }

    /// Adds a session and broadcasts `join` to everyone, the new session
    /// included.
    ///
    /// # Errors
    /// [`HubError::AlreadyOnline`] if the user already has a session. The
    /// client handle is dropped and nothing is broadcast.
    pub async fn register(&self, client: ClientHandle) -> Result<(), HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HubCommand::Register {
            client,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)?
    }

    /// Removes a session and takes it off the grid.
    ///
    /// If the session was still registered, its queue is closed and
    /// `disconnect` is broadcast. If it held a grid position, `joinGame`
    /// listing it under `disconnecting` is broadcast as well. Returns once
    /// both steps are done.
    pub async fn unregister(&self, session_id: SessionId) -> Result<(), HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HubCommand::Unregister {
            session_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Re-broadcasts presence as `join` or `disconnect` naming `session_id`.
    pub async fn announce(
        &self,
        kind: PresenceKind,
        session_id: SessionId,
    ) -> Result<(), HubError> {
        self.send(HubCommand::Announce { kind, session_id }).await
    }

    /// The online sessions, oldest first.
    pub async fn presence(&self) -> Result<Vec<UserSummary>, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HubCommand::Presence { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Resolves one session id to its identity.
    pub async fn lookup(&self, session_id: SessionId) -> Result<Option<UserSummary>, HubError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HubCommand::Lookup {
            session_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Delivers `event` to one session. Unknown ids are ignored.
    pub async fn unicast(&self, session_id: SessionId, event: ServerEvent) -> Result<(), HubError> {
        self.route(Route::One(session_id), event).await
    }

    /// Delivers `event` to every online session.
    pub async fn broadcast(&self, event: ServerEvent) -> Result<(), HubError> {
        self.route(Route::All, event).await
    }

    /// Delivers `event` to every online session but `session_id`.
    pub async fn broadcast_except(
        &self,
        session_id: SessionId,
        event: ServerEvent,
    ) -> Result<(), HubError> {
        self.route(Route::AllExcept(session_id), event).await
    }

    async fn route(&self, route: Route, event: ServerEvent) -> Result<(), HubError> {
        self.send(HubCommand::Route { route, event }).await
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.sender.send(cmd).await.map_err(|_| HubError::Unavailable)
    }
}

/// The hub's state. Runs inside a Tokio task.
struct HubActor {
    registry: Registry,
    game: GameHandle,
    receiver: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    async fn run(mut self) {
        tracing::info!("hub started");

        while let Some(cmd) = self.receiver.recv().await {
            tracing::trace!(?cmd, "hub command");
            match cmd {
                HubCommand::Register { client, reply } => {
                    let _ = reply.send(self.handle_register(client));
                }
                HubCommand::Unregister { session_id, reply } => {
                    self.handle_unregister(session_id).await;
                    let _ = reply.send(());
                }
                HubCommand::Announce { kind, session_id } => {
                    self.broadcast_presence(kind, session_id);
                }
                HubCommand::Presence { reply } => {
                    let _ = reply.send(self.registry.presence());
                }
                HubCommand::Lookup { session_id, reply } => {
                    let summary = self.registry.get(&session_id).map(ClientHandle::summary);
                    let _ = reply.send(summary);
                }
                HubCommand::Route { route, event } => self.handle_route(route, event),
            }
        }

        tracing::info!("hub stopped");
    }

    fn handle_register(&mut self, client: ClientHandle) -> Result<(), HubError> {
        let session_id = client.session_id().clone();
        let user_id = client.user_id();

        if let Err(e) = self.registry.insert(client) {
            tracing::info!(%session_id, %user_id, "registration refused: {e}");
            return Err(e);
        }

        tracing::info!(
            %session_id,
            %user_id,
            online = self.registry.len(),
            "session registered"
        );
        self.broadcast_presence(PresenceKind::Join, session_id);
        Ok(())
    }

    async fn handle_unregister(&mut self, session_id: SessionId) {
        let summary = match self.registry.remove(&session_id) {
            Some(client) => {
                let summary = client.summary();
                drop(client);
                tracing::info!(
                    %session_id,
                    user_id = %summary.user_id,
                    online = self.registry.len(),
                    "session unregistered"
                );
                self.broadcast_presence(PresenceKind::Disconnect, session_id.clone());
                summary
            }
            None => UserSummary::unknown(session_id.clone()),
        };

        match self.game.remove(session_id.clone()).await {
            Ok(Some(position)) => {
                let event = ServerEvent::JoinGame(JoinGamePayload {
                    joining: Vec::new(),
                    disconnecting: vec![UserLocation {
                        user: summary,
                        position,
                    }],
                });
                self.registry.broadcast(&event, None);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(%session_id, error = %e, "failed to remove session from game");
            }
        }
    }

    fn broadcast_presence(&mut self, kind: PresenceKind, session_id: SessionId) {
        let payload = PresencePayload {
            client_id: session_id,
            users: self.registry.presence(),
        };
        let event = match kind {
            PresenceKind::Join => ServerEvent::Join(payload),
            PresenceKind::Disconnect => ServerEvent::Disconnect(payload),
        };
        self.registry.broadcast(&event, None);
    }

    fn handle_route(&mut self, route: Route, event: ServerEvent) {
        let name = event.name();
        let evicted = match route {
            Route::One(session_id) => match self.registry.deliver(&session_id, event) {
                Delivery::Delivered => 0,
                Delivery::Evicted => 1,
                Delivery::Unknown => {
                    tracing::debug!(%session_id, event = name, "unicast to unknown session");
                    0
                }
            },
            Route::All => self.registry.broadcast(&event, None).len(),
            Route::AllExcept(session_id) => {
                self.registry.broadcast(&event, Some(&session_id)).len()
            }
        };
        if evicted > 0 {
            tracing::debug!(
                event = name,
                evicted,
                online = self.registry.len(),
                "routed with evictions"
            );
        }
    }
}
