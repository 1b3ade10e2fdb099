//! Error types for the hub layer.

use skirmish_protocol::UserId;

/// Errors returned by the hub and by [`Authenticator`](crate::Authenticator)s.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Another session for this user is already online.
    #[error("user {0} already has an online session")]
    AlreadyOnline(UserId),

    /// The connect token was missing, malformed, or rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The hub task has stopped.
    #[error("hub is unavailable")]
    Unavailable,
}
