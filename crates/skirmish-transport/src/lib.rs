//! Transport layer for Skirmish.
//!
//! Provides the [`Connection`] trait that the per-connection actor is
//! written against, and the WebSocket gateway that produces real
//! connections.
//!
//! A connection is used by two tasks at once: one reading frames, one
//! writing them. Implementations must therefore let `recv` and
//! `send_batch`/`ping` run concurrently without one blocking the other.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    PendingConnection, UpgradeConfig, WebSocketConnection, WebSocketTransport,
};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a transport connection. Used in logs only;
/// the session layer assigns its own ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One inbound unit from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A data frame (text or binary), as raw bytes.
    Data(Vec<u8>),
    /// The peer answered one of our keepalive pings.
    Pong,
}

/// A single bidirectional connection.
///
/// The methods return `impl Future + Send` rather than being plain
/// `async fn` so that generic callers can move the futures into
/// `tokio::spawn`. Implementors can still write `async fn`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Receives the next frame from the peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(&self) -> impl Future<Output = Result<Option<Frame>, Self::Error>> + Send;

    /// Writes several data frames and flushes once.
    ///
    /// Each element becomes its own frame, so the peer can still parse
    /// them one at a time.
    fn send_batch(
        &self,
        frames: Vec<Vec<u8>>,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Writes a single data frame.
    fn send(&self, data: Vec<u8>) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.send_batch(vec![data])
    }

    /// Writes a keepalive probe. The peer's answer shows up as
    /// [`Frame::Pong`] on the reading side.
    fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Sends a close frame and shuts the writing side down.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_equality() {
        assert_eq!(ConnectionId::new(42), ConnectionId::new(42));
        assert_ne!(ConnectionId::new(42), ConnectionId::new(43));
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
