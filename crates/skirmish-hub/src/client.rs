//! What the hub keeps for each online session.

use skirmish_protocol::{ServerEvent, SessionId, UserId, UserSummary};
use tokio::sync::mpsc;

use crate::Identity;

/// A registered session: its identity plus the sending half of its
/// outbound queue.
///
/// The hub owns these once registered. Dropping the handle (on eviction
/// or unregistration) closes the queue, which tells the session's writer
/// to send a close frame and stop.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    session_id: SessionId,
    identity: Identity,
    sender: mpsc::Sender<ServerEvent>,
}

impl ClientHandle {
    pub fn new(
        session_id: SessionId,
        identity: Identity,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Self {
        Self {
            session_id,
            identity,
            sender,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.identity.user_name
    }

    /// The presence-list entry for this session.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            client_id: self.session_id.clone(),
            user_id: self.identity.user_id,
            user_name: self.identity.user_name.clone(),
        }
    }

    pub(crate) fn sender(&self) -> &mpsc::Sender<ServerEvent> {
        &self.sender
    }
}

/// Which presence event to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceKind {
    Join,
    Disconnect,
}
