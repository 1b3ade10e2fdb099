//! The presence registry and the delivery rules for routed events.
//!
//! `Registry` is plain data, not thread-safe by itself: the hub task owns
//! it and every access goes through that task.

use skirmish_protocol::{ServerEvent, SessionId, UserSummary};
use tokio::sync::mpsc::error::TrySendError;

use crate::{ClientHandle, HubError};

/// What happened to one unicast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the recipient.
    Delivered,
    /// The recipient's queue was full or closed; it has been removed.
    Evicted,
    /// No session with that id is registered.
    Unknown,
}

/// Online sessions in registration order, at most one per user id.
#[derive(Debug, Default)]
pub struct Registry {
    clients: Vec<ClientHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session.
    ///
    /// # Errors
    /// [`HubError::AlreadyOnline`] if a session for the same user is
    /// registered. The registry is left unchanged.
    pub fn insert(&mut self, client: ClientHandle) -> Result<(), HubError> {
        if self.clients.iter().any(|c| c.user_id() == client.user_id()) {
            return Err(HubError::AlreadyOnline(client.user_id()));
        }
        self.clients.push(client);
        Ok(())
    }

    /// Removes a session, returning its handle. Dropping the returned
    /// handle closes the session's queue.
    pub fn remove(&mut self, session_id: &SessionId) -> Option<ClientHandle> {
        let index = self
            .clients
            .iter()
            .position(|c| c.session_id() == session_id)?;
        Some(self.clients.remove(index))
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&ClientHandle> {
        self.clients.iter().find(|c| c.session_id() == session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.get(session_id).is_some()
    }

    /// Summaries of every online session, oldest registration first.
    pub fn presence(&self) -> Vec<UserSummary> {
        self.clients.iter().map(ClientHandle::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queues `event` for one session without waiting.
    pub fn deliver(&mut self, session_id: &SessionId, event: ServerEvent) -> Delivery {
        let Some(client) = self.get(session_id) else {
            return Delivery::Unknown;
        };
        match client.sender().try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                self.evict(session_id, &e);
                Delivery::Evicted
            }
        }
    }

    /// Queues `event` for every session except `except`. Returns the ids
    /// of sessions evicted along the way.
    pub fn broadcast(
        &mut self,
        event: &ServerEvent,
        except: Option<&SessionId>,
    ) -> Vec<SessionId> {
        let mut failed = Vec::new();
        for client in &self.clients {
            if Some(client.session_id()) == except {
                continue;
            }
            if let Err(e) = client.sender().try_send(event.clone()) {
                failed.push((client.session_id().clone(), e));
            }
        }
        for (session_id, e) in &failed {
            self.evict(session_id, e);
        }
        failed.into_iter().map(|(id, _)| id).collect()
    }

    fn evict(&mut self, session_id: &SessionId, reason: &TrySendError<ServerEvent>) {
        let reason = match reason {
            TrySendError::Full(_) => "queue full",
            TrySendError::Closed(_) => "queue closed",
        };
        if let Some(client) = self.remove(session_id) {
            tracing::warn!(
                %session_id,
                user_id = %client.user_id(),
                reason,
                "evicting slow session"
            );
        }
    }
}
