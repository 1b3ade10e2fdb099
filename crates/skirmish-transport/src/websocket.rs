//! WebSocket gateway using `tokio-tungstenite`.
//!
//! Accepting a connection happens in two steps so a slow client can't stall
//! the accept loop:
//!
//! 1. [`WebSocketTransport::accept`] takes the TCP connection off the
//!    listener and returns a [`PendingConnection`] right away.
//! 2. [`PendingConnection::upgrade`] runs the HTTP upgrade (inside the
//!    per-connection task), applies the frame-size limit, and captures the
//!    `token` query parameter for the authenticator.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::{Connection, ConnectionId, Frame, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Settings applied while upgrading a connection.
#[derive(Debug, Clone)]
pub struct UpgradeConfig {
    /// Largest inbound message (and frame) accepted, in bytes. Anything
    /// bigger fails the read.
    pub max_message_size: usize,
    /// How long a client gets to finish the HTTP upgrade.
    pub handshake_timeout: Duration,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            max_message_size: 512,
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

/// A TCP listener that hands out WebSocket connections.
pub struct WebSocketTransport {
    listener: TcpListener,
    config: UpgradeConfig,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(
        addr: &str,
        config: UpgradeConfig,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener, config })
    }

    /// Returns the address the listener is bound to. Useful after binding
    /// to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next TCP connection. The WebSocket upgrade hasn't
    /// happened yet; call [`PendingConnection::upgrade`] for that.
    pub async fn accept(&self) -> Result<PendingConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        Ok(PendingConnection {
            stream,
            addr,
            config: self.config.clone(),
        })
    }
}

/// An accepted TCP connection that hasn't been upgraded yet.
pub struct PendingConnection {
    stream: TcpStream,
    addr: SocketAddr,
    config: UpgradeConfig,
}

impl PendingConnection {
    /// The remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Performs the WebSocket upgrade.
    pub async fn upgrade(self) -> Result<WebSocketConnection, TransportError> {
        let addr = self.addr;
        let mut token = None;
        let capture_token = |req: &Request,
                             resp: Response|
         -> Result<Response, ErrorResponse> {
            token = req.uri().query().and_then(|q| query_param(q, "token"));
            Ok(resp)
        };

        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(self.config.max_message_size))
            .max_frame_size(Some(self.config.max_message_size));

        let ws = tokio::time::timeout(
            self.config.handshake_timeout,
            tokio_tungstenite::accept_hdr_async_with_config(
                self.stream,
                capture_token,
                Some(ws_config),
            ),
        )
        .await
        .map_err(|_| {
            TransportError::AcceptFailed(io::Error::new(
                io::ErrorKind::TimedOut,
                "websocket handshake timed out",
            ))
        })?
        .map_err(|e| {
            TransportError::AcceptFailed(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            addr,
            token,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single upgraded WebSocket connection.
///
/// The stream is split so that reading and writing take different locks:
/// the inbound loop can sit in `recv` for up to a minute without holding up
/// the outbound loop's writes.
pub struct WebSocketConnection {
    id: ConnectionId,
    addr: SocketAddr,
    token: Option<String>,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// The `token` query parameter of the upgrade request, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The remote address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Maps a sink error. Writing after either side closed is reported as
/// [`TransportError::ConnectionClosed`].
fn send_failed(e: WsError) -> TransportError {
    match e {
        WsError::ConnectionClosed | WsError::AlreadyClosed => {
            TransportError::ConnectionClosed(e.to_string())
        }
        other => TransportError::SendFailed(io::Error::new(io::ErrorKind::BrokenPipe, other)),
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn recv(&self) -> Result<Option<Frame>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(Frame::Data(text.as_bytes().to_vec())));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(Frame::Data(data.to_vec())));
                }
                Some(Ok(Message::Pong(_))) => return Ok(Some(Frame::Pong)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn send_batch(&self, frames: Vec<Vec<u8>>) -> Result<(), Self::Error> {
        let mut sink = self.sink.lock().await;
        for frame in frames {
            let text = String::from_utf8(frame).map_err(|e| {
                TransportError::SendFailed(io::Error::new(
                    io::ErrorKind::InvalidData,
                    e,
                ))
            })?;
            sink.feed(Message::text(text)).await.map_err(send_failed)?;
        }
        sink.flush().await.map_err(send_failed)
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .send(Message::Ping(Default::default()))
            .await
            .map_err(send_failed)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(send_failed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Extracts one parameter from a URL query string (`a=1&token=xyz`).
///
/// Values are returned verbatim; tokens are expected to be URL-safe.
fn query_param(query: &str, key: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}
