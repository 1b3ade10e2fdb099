//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! Two things go through it: events on the wire, and the game-state blob
//! kept in the durable store. Both are JSON today, but callers only depend
//! on the [`Codec`] trait.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync` → safe to share between tasks on Tokio's thread pool.
/// - `'static` → the codec owns everything it needs, so it can live inside
///   long-lived actor tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser clients parse every frame with `JSON.parse`, so JSON is the
/// only wire format the session layer speaks.
///
/// ## Example
///
/// ```rust
/// use skirmish_protocol::{Codec, Event, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = br#"{"eventName":"joinGame","eventPayload":{}}"#;
///
/// let event: Event = codec.decode(bytes).unwrap();
/// assert_eq!(event.event_name, "joinGame");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
