//! A development authenticator.

use skirmish_hub::{Authenticator, HubError, Identity};
use skirmish_protocol::UserId;

/// Trusts tokens of the form `<userId>:<userName>`.
///
/// Any client can claim any identity, so this is only for local play and
/// tests. Production deployments plug in their own [`Authenticator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DevAuthenticator;

impl DevAuthenticator {
    /// Parses a `<userId>:<userName>` token.
    pub fn parse(token: &str) -> Result<Identity, HubError> {
        let (id, name) = token
            .split_once(':')
            .ok_or_else(|| HubError::AuthFailed("expected <userId>:<userName>".into()))?;
        let id: i64 = id
            .parse()
            .map_err(|_| HubError::AuthFailed(format!("user id {id:?} is not a number")))?;
        if name.is_empty() {
            return Err(HubError::AuthFailed("user name is empty".into()));
        }
        Ok(Identity::new(UserId(id), name))
    }
}

impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, HubError> {
        Self::parse(token)
    }
}
