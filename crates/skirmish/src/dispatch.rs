//! Turns one decoded client event into hub and game actions.

use std::collections::HashMap;

use skirmish_game::{GameHandle, GameState, JoinOutcome};
use skirmish_hub::{HubHandle, PresenceKind};
use skirmish_protocol::{
    ClientEvent, GameStatePayload, JoinGamePayload, MessageRequest, MessageResponsePayload,
    MovePayload, ServerEvent, SessionId, Step, UserLocation, UserSummary,
};

use crate::SkirmishError;

/// Routes client events. Cheap to clone; each connection holds one.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    hub: HubHandle,
    game: GameHandle,
}

impl Dispatcher {
    pub fn new(hub: HubHandle, game: GameHandle) -> Self {
        Self { hub, game }
    }

    /// Handles one event from `me`.
    ///
    /// Never fails: hub or game errors are logged and the event is dropped,
    /// so a bad event can't take the connection down.
    pub async fn dispatch(&self, me: &UserSummary, event: ClientEvent) {
        let name = event_name(&event);
        tracing::debug!(session_id = %me.client_id, event = name, "dispatching");

        if let Err(e) = self.handle(me, event).await {
            tracing::warn!(
                session_id = %me.client_id,
                event = name,
                error = %e,
                "event dropped"
            );
        }
    }

    async fn handle(&self, me: &UserSummary, event: ClientEvent) -> Result<(), SkirmishError> {
        match event {
            ClientEvent::Join => {
                self.hub.announce(PresenceKind::Join, me.client_id.clone()).await?;
            }
            ClientEvent::Disconnect => {
                self.hub
                    .announce(PresenceKind::Disconnect, me.client_id.clone())
                    .await?;
            }
            ClientEvent::JoinGame => self.join_game(me).await?,
            ClientEvent::Message(request) => self.message(me, request).await?,
            ClientEvent::Move(step) => self.move_player(me, step).await?,
        }
        Ok(())
    }

    async fn join_game(&self, me: &UserSummary) -> Result<(), SkirmishError> {
        let (position, state) = match self.game.join(me.client_id.clone()).await? {
            JoinOutcome::Joined { position, state } => (position, state),
            JoinOutcome::AlreadyJoined { .. } => {
                tracing::debug!(session_id = %me.client_id, "already in game");
                return Ok(());
            }
            JoinOutcome::GridFull => {
                tracing::info!(session_id = %me.client_id, "grid full, join ignored");
                return Ok(());
            }
        };

        let joined = ServerEvent::JoinGame(JoinGamePayload {
            joining: vec![UserLocation {
                user: me.clone(),
                position,
            }],
            disconnecting: Vec::new(),
        });
        self.hub.broadcast_except(me.client_id.clone(), joined).await?;

        let connected = self.resolve(&state).await?;
        self.hub
            .unicast(
                me.client_id.clone(),
                ServerEvent::GameState(GameStatePayload { connected }),
            )
            .await?;
        Ok(())
    }

    /// Pairs every placed session with its identity. Sessions that are no
    /// longer online get the zero identity.
    async fn resolve(&self, state: &GameState) -> Result<Vec<UserLocation>, SkirmishError> {
        let online: HashMap<SessionId, UserSummary> = self
            .hub
            .presence()
            .await?
            .into_iter()
            .map(|u| (u.client_id.clone(), u))
            .collect();

        Ok(state
            .iter()
            .map(|(session_id, position)| UserLocation {
                user: online
                    .get(session_id)
                    .cloned()
                    .unwrap_or_else(|| UserSummary::unknown(session_id.clone())),
                position,
            })
            .collect())
    }

    async fn message(&self, me: &UserSummary, request: MessageRequest) -> Result<(), SkirmishError> {
        let target = self.hub.lookup(request.target.clone()).await?;
        let response = MessageResponsePayload {
            user_id: target.map(|t| t.user_id).unwrap_or_default(),
            message: request.message,
            client_id: request.target.clone(),
            from_id: me.user_id,
            from_client_id: me.client_id.clone(),
        };
        self.hub
            .unicast(request.target, ServerEvent::MessageResponse(response))
            .await?;
        Ok(())
    }

    async fn move_player(&self, me: &UserSummary, step: Step) -> Result<(), SkirmishError> {
        let Some(position) = self.game.move_player(me.client_id.clone(), step).await? else {
            tracing::debug!(session_id = %me.client_id, "move before joining game ignored");
            return Ok(());
        };

        let moved = ServerEvent::Move(MovePayload {
            x: position.x,
            y: position.y,
            client_id: me.client_id.clone(),
            user_name: me.user_name.clone(),
        });
        self.hub.broadcast(moved).await?;
        Ok(())
    }
}

fn event_name(event: &ClientEvent) -> &'static str {
    match event {
        ClientEvent::Join => "join",
        ClientEvent::Disconnect => "disconnect",
        ClientEvent::JoinGame => "joinGame",
        ClientEvent::Message(_) => "message",
        ClientEvent::Move(_) => "move",
    }
}
