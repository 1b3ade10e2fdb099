//! Error types for the protocol layer.
//!
//! Each crate in Skirmish defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or event
//! validation, not in networking or the game grid.

/// Errors that can occur in the protocol layer.
///
/// The variants split into two severities, and callers treat them
/// differently:
///
/// - [`Decode`](Self::Decode) means the frame wasn't even a well-formed
///   envelope. The connection that sent it is torn down.
/// - [`UnknownEvent`](Self::UnknownEvent) and
///   [`InvalidPayload`](Self::InvalidPayload) mean the envelope was fine
///   but its content didn't pass validation. The event is dropped and the
///   connection stays open.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing `eventName`, truncated
    /// frames.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope named an event this server doesn't accept from clients.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// The payload didn't match the shape required by its event name:
    /// a missing field, a wrong type, an unknown field, or a value out of
    /// range.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload { event: String, reason: String },
}

impl ProtocolError {
    /// Returns `true` if the error means the whole frame was unreadable.
    ///
    /// A fatal error ends the connection; anything else only drops the
    /// offending event.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Encode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fatal_decode_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(ProtocolError::Decode(err).is_fatal());
    }

    #[test]
    fn test_is_fatal_validation_errors_are_recoverable() {
        assert!(!ProtocolError::UnknownEvent("fly".into()).is_fatal());
        assert!(
            !ProtocolError::InvalidPayload {
                event: "move".into(),
                reason: "x out of range".into(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_invalid_payload_display_names_event() {
        let err = ProtocolError::InvalidPayload {
            event: "message".into(),
            reason: "missing field `userID`".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid payload for message: missing field `userID`"
        );
    }
}
