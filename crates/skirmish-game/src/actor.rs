//! Game actor: the single task that owns read-modify-write access to the
//! stored grid.
//!
//! Every command loads the blob from the store, applies one
//! [`GameState`] operation, and writes the result back before the next
//! command is looked at. Callers talk to it through a [`GameHandle`].

use rand::SeedableRng;
use rand::rngs::StdRng;
use skirmish_protocol::{Codec, JsonCodec, Position, SessionId, Step};
use tokio::sync::{mpsc, oneshot};

use crate::{GameConfig, GameError, GameState, KeyValueStore};

/// Result of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The session was placed. `state` is the grid right after placement.
    Joined { position: Position, state: GameState },
    /// The session was already on the grid. Nothing changed.
    AlreadyJoined { position: Position },
    /// No free cell left.
    GridFull,
}

/// Commands sent to the game actor. Each carries a reply channel.
enum GameCommand {
    Join {
        session_id: SessionId,
        reply: oneshot::Sender<Result<JoinOutcome, GameError>>,
    },
    Move {
        session_id: SessionId,
        step: Step,
        reply: oneshot::Sender<Result<Option<Position>, GameError>>,
    },
    Remove {
        session_id: SessionId,
        reply: oneshot::Sender<Result<Option<Position>, GameError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<GameState, GameError>>,
    },
}

/// Handle to the running game actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GameHandle {
    sender: mpsc::Sender<GameCommand>,
}

impl std::fmt::Debug for GameCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Join { session_id, .. } => write!(f, "Join({session_id})"),
            Self::Move { session_id, step, .. } => {
                write!(f, "Move({session_id}, {}, {})", step.x, step.y)
            }
            Self::Remove { session_id, .. } => write!(f, "Remove({session_id})"),
            Self::Snapshot { .. } => f.write_str("Snapshot"),
        }
    }
}

impl GameHandle {
    /// Spawns the actor task over `store` and returns a handle to it.
    ///
    /// With [`GameConfig::reset_on_start`] set, the stored grid is replaced
    /// by an empty one before the first command is served.
    pub fn spawn<S: KeyValueStore>(config: GameConfig, store: S) -> Self {
        let (tx, rx) = mpsc::channel(config.channel_size.max(1));

        let actor = GameActor {
            config,
            store,
            rng: StdRng::from_os_rng(),
            codec: JsonCodec,
            receiver: rx,
        };
        tokio::spawn(actor.run());

        Self { sender: tx }
    }

    /// Places the session on a random free cell.
    pub async fn join(&self, session_id: SessionId) -> Result<JoinOutcome, GameError> {
        self.request(|reply| GameCommand::Join { session_id, reply })
            .await
    }

    /// Moves the session by `step`. `Ok(None)` means the session hasn't
    /// joined; otherwise the position afterwards (possibly unchanged).
    pub async fn move_player(
        &self,
        session_id: SessionId,
        step: Step,
    ) -> Result<Option<Position>, GameError> {
        self.request(|reply| GameCommand::Move {
            session_id,
            step,
            reply,
        })
        .await
    }

    /// Takes the session off the grid, returning its last position.
    pub async fn remove(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Position>, GameError> {
        self.request(|reply| GameCommand::Remove { session_id, reply })
            .await
    }

    /// Reads the current grid.
    pub async fn snapshot(&self) -> Result<GameState, GameError> {
        self.request(|reply| GameCommand::Snapshot { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T, GameError>>) -> GameCommand,
    ) -> Result<T, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| GameError::Unavailable)?;
        reply_rx.await.map_err(|_| GameError::Unavailable)?
    }
}

/// The actor state. Runs inside a Tokio task.
struct GameActor<S> {
    config: GameConfig,
    store: S,
    rng: StdRng,
    codec: JsonCodec,
    receiver: mpsc::Receiver<GameCommand>,
}

impl<S: KeyValueStore> GameActor<S> {
    async fn run(mut self) {
        tracing::info!(
            key = %self.config.state_key,
            width = self.config.grid.width,
            height = self.config.grid.height,
            "game actor started"
        );

        if self.config.reset_on_start {
            tracing::info!(key = %self.config.state_key, "resetting stored grid");
            self.save(&GameState::new()).await;
        }

        while let Some(cmd) = self.receiver.recv().await {
            tracing::trace!(?cmd, "game command");
            match cmd {
                GameCommand::Join { session_id, reply } => {
                    let _ = reply.send(self.handle_join(session_id).await);
                }
                GameCommand::Move {
                    session_id,
                    step,
                    reply,
                } => {
                    let _ = reply.send(self.handle_move(session_id, step).await);
                }
                GameCommand::Remove { session_id, reply } => {
                    let _ = reply.send(self.handle_remove(session_id).await);
                }
                GameCommand::Snapshot { reply } => {
                    let _ = reply.send(self.load().await);
                }
            }
        }

        tracing::info!(key = %self.config.state_key, "game actor stopped");
    }

    async fn handle_join(&mut self, session_id: SessionId) -> Result<JoinOutcome, GameError> {
        let mut state = self.load().await?;
        if let Some(position) = state.position(&session_id) {
            return Ok(JoinOutcome::AlreadyJoined { position });
        }

        let grid = self.config.grid;
        let Some(position) = state.spawn(&grid, session_id.clone(), &mut self.rng) else {
            tracing::warn!(%session_id, occupied = state.len(), "grid is full");
            return Ok(JoinOutcome::GridFull);
        };

        self.save(&state).await;
        tracing::info!(%session_id, x = position.x, y = position.y, "session joined game");
        Ok(JoinOutcome::Joined { position, state })
    }

    async fn handle_move(
        &mut self,
        session_id: SessionId,
        step: Step,
    ) -> Result<Option<Position>, GameError> {
        let mut state = self.load().await?;
        let after = state.move_player(&self.config.grid, &session_id, step);

        // Blocked and zero steps are written back too.
        if after.is_some() {
            self.save(&state).await;
        }
        Ok(after)
    }

    async fn handle_remove(
        &mut self,
        session_id: SessionId,
    ) -> Result<Option<Position>, GameError> {
        let mut state = self.load().await?;
        let removed = state.remove(&session_id);
        if removed.is_some() {
            self.save(&state).await;
            tracing::debug!(%session_id, "session removed from game");
        }
        Ok(removed)
    }

    /// Reads the stored grid. A missing key is an empty grid, and so is a
    /// blob that doesn't parse.
    async fn load(&self) -> Result<GameState, GameError> {
        let key = &self.config.state_key;
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(GameState::new());
        };
        match self.codec.decode(&bytes) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(%key, error = %e, "stored grid is corrupt, starting empty");
                Ok(GameState::new())
            }
        }
    }

    /// Writes the grid back. Failures are logged and otherwise ignored:
    /// the caller still gets the in-memory result.
    async fn save(&self, state: &GameState) {
        let key = &self.config.state_key;
        let bytes = match self.codec.encode(state) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%key, error = %e, "failed to encode grid");
                return;
            }
        };
        if let Err(e) = self.store.set(key, bytes).await {
            tracing::warn!(%key, error = %e, "failed to persist grid");
        }
    }
}
