//! Unified error type for the Skirmish server.

use skirmish_game::{GameError, StoreError};
use skirmish_hub::HubError;
use skirmish_protocol::ProtocolError;
use skirmish_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Connection-level failure (accept, upgrade, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame that isn't a well-formed event envelope.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registration refused, authentication failed, or the hub is gone.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// The game actor couldn't serve a request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Opening the durable store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A read or write deadline passed.
    #[error("{0} deadline exceeded")]
    Timeout(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Transport(_)));
        assert!(skirmish_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownEvent("dance".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Protocol(_)));
    }

    #[test]
    fn test_from_hub_error() {
        let err = HubError::AuthFailed("nope".into());
        let skirmish_err: SkirmishError = err.into();
        assert!(matches!(skirmish_err, SkirmishError::Hub(_)));
    }

    #[test]
    fn test_from_game_error() {
        let skirmish_err: SkirmishError = GameError::Unavailable.into();
        assert!(matches!(skirmish_err, SkirmishError::Game(_)));
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            SkirmishError::Timeout("write").to_string(),
            "write deadline exceeded"
        );
    }
}
