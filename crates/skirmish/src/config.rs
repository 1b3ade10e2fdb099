//! Per-connection timing and sizing.

use std::time::Duration;

use skirmish_transport::UpgradeConfig;

/// Settings for each client connection.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long the reader waits for the peer's next pong. Each pong pushes
    /// the read deadline this far into the future.
    pub pong_wait: Duration,

    /// Time allowed for one write (a batch of events, a ping, or the close
    /// frame).
    pub write_wait: Duration,

    /// Largest inbound message accepted, in bytes.
    pub max_message_size: usize,

    /// Capacity of the per-client outbound queue. A client whose queue is
    /// full when an event is routed to it gets evicted.
    pub send_queue_capacity: usize,

    /// How long a client gets to finish the WebSocket upgrade.
    pub handshake_timeout: Duration,
}

impl ClientConfig {
    /// Keepalive interval: nine tenths of `pong_wait`, so a ping always
    /// lands before the peer's read deadline runs out.
    pub fn ping_period(&self) -> Duration {
        self.pong_wait * 9 / 10
    }

    pub(crate) fn upgrade_config(&self) -> UpgradeConfig {
        UpgradeConfig {
            max_message_size: self.max_message_size,
            handshake_timeout: self.handshake_timeout,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_size: 512,
            send_queue_capacity: 256,
            handshake_timeout: Duration::from_secs(5),
        }
    }
}
