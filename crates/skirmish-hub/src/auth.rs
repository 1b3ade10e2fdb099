//! Authentication hook for connecting clients.
//!
//! Skirmish doesn't validate tokens itself. The gateway hands the `token`
//! query parameter of the upgrade request to an [`Authenticator`], which
//! answers with the [`Identity`] the session will run as.

use std::future::Future;

use skirmish_protocol::UserId;

use crate::HubError;

/// A verified user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub user_name: String,
}

impl Identity {
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

/// Validates a client's connect token and returns their identity.
///
/// `Send + Sync + 'static` so one instance can be shared by every
/// connection task for the life of the server.
///
/// # Example
///
/// ```rust
/// use skirmish_hub::{Authenticator, HubError, Identity};
/// use skirmish_protocol::UserId;
///
/// /// Accepts tokens of the form `<id>`, naming everyone "guest".
/// struct GuestAuthenticator;
///
/// impl Authenticator for GuestAuthenticator {
///     async fn authenticate(&self, token: &str) -> Result<Identity, HubError> {
///         let id: i64 = token
///             .parse()
///             .map_err(|_| HubError::AuthFailed("token must be a number".into()))?;
///         Ok(Identity::new(UserId(id), "guest"))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token`.
    ///
    /// Returns [`HubError::AuthFailed`] when the token is not acceptable.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Identity, HubError>> + Send;
}
