//! Per-connection actor: one reader, one writer, one outbound queue.
//!
//! ```text
//!   peer ──frames──→ reader ──ClientEvent──→ Dispatcher ──→ hub / game
//!   peer ←─frames─── writer ←──ServerEvent── queue ←─────── hub
//! ```
//!
//! The reader runs on the connection's task; the writer is spawned beside
//! it. The reader alone calls `unregister`, exactly once, whichever side
//! stops first: when the writer exits it drops a oneshot sender, which
//! wakes the reader.

use std::sync::Arc;

use skirmish_hub::{ClientHandle, HubHandle, Identity};
use skirmish_protocol::{
    ClientEvent, Codec, Event, JsonCodec, RejectedPayload, ServerEvent, SessionId, UserSummary,
};
use skirmish_transport::{Connection, Frame, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::{ClientConfig, Dispatcher, SkirmishError};

/// One connected client.
pub struct ClientActor<C> {
    conn: Arc<C>,
    hub: HubHandle,
    dispatcher: Dispatcher,
    session_id: SessionId,
    identity: Identity,
    config: ClientConfig,
    codec: JsonCodec,
}

impl<C> ClientActor<C>
where
    C: Connection<Error = TransportError>,
{
    /// Creates the actor with a fresh session id.
    pub fn new(
        conn: C,
        hub: HubHandle,
        dispatcher: Dispatcher,
        identity: Identity,
        config: ClientConfig,
    ) -> Self {
        Self {
            conn: Arc::new(conn),
            hub,
            dispatcher,
            session_id: SessionId::generate(),
            identity,
            config,
            codec: JsonCodec,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Registers with the hub and runs until the connection ends.
    ///
    /// A refused registration sends `rejected`, closes the connection, and
    /// returns the hub's error.
    pub async fn run(self) -> Result<(), SkirmishError> {
        let (tx, rx) = mpsc::channel(self.config.send_queue_capacity.max(1));
        let handle = ClientHandle::new(self.session_id.clone(), self.identity.clone(), tx);
        let me = handle.summary();

        if let Err(e) = self.hub.register(handle).await {
            let _ = reject(&*self.conn, &self.codec, &e.to_string(), &self.config).await;
            return Err(e.into());
        }
        tracing::info!(
            session_id = %self.session_id,
            user_id = %self.identity.user_id,
            conn_id = %self.conn.id(),
            "client connected"
        );

        let (done_tx, done_rx) = oneshot::channel::<()>();
        let writer = tokio::spawn(write_loop(
            Arc::clone(&self.conn),
            rx,
            self.config.clone(),
            self.codec,
            self.session_id.clone(),
            done_tx,
        ));

        let result = self.read_loop(&me, done_rx).await;
        if let Err(e) = &result {
            tracing::debug!(session_id = %self.session_id, error = %e, "reader stopped");
        }

        if let Err(e) = self.hub.unregister(self.session_id.clone()).await {
            tracing::warn!(session_id = %self.session_id, error = %e, "unregister failed");
        }
        // Unregistering dropped the queue's sender; the writer sends a
        // close frame and exits.
        match writer.await {
            Ok(Err(e)) => {
                tracing::debug!(session_id = %self.session_id, error = %e, "writer stopped");
            }
            Err(e) => tracing::warn!(session_id = %self.session_id, error = %e, "writer panicked"),
            Ok(Ok(())) => {}
        }
        let _ = self.conn.close().await;

        tracing::info!(session_id = %self.session_id, "client disconnected");
        result
    }

    async fn read_loop(
        &self,
        me: &UserSummary,
        mut writer_done: oneshot::Receiver<()>,
    ) -> Result<(), SkirmishError> {
        let mut deadline = Instant::now() + self.config.pong_wait;

        loop {
            let frame = tokio::select! {
                biased;
                _ = &mut writer_done => return Ok(()),
                frame = tokio::time::timeout_at(deadline, self.conn.recv()) => frame,
            };

            let bytes = match frame.map_err(|_| SkirmishError::Timeout("read"))?? {
                Some(Frame::Data(bytes)) => bytes,
                Some(Frame::Pong) => {
                    deadline = Instant::now() + self.config.pong_wait;
                    continue;
                }
                None => return Ok(()),
            };

            let event = self
                .codec
                .decode::<Event>(&bytes)
                .and_then(ClientEvent::try_from);
            match event {
                Ok(event) => self.dispatcher.dispatch(me, event).await,
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    tracing::debug!(session_id = %self.session_id, error = %e, "dropping event");
                }
            }
        }
    }
}

/// Drains the outbound queue into the connection and keeps it alive with
/// pings. Returns when the queue closes or a write fails.
async fn write_loop<C>(
    conn: Arc<C>,
    mut queue: mpsc::Receiver<ServerEvent>,
    config: ClientConfig,
    codec: JsonCodec,
    session_id: SessionId,
    _done: oneshot::Sender<()>,
) -> Result<(), SkirmishError>
where
    C: Connection<Error = TransportError>,
{
    let period = config.ping_period();
    let mut keepalive = tokio::time::interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            next = queue.recv() => {
                let Some(first) = next else {
                    tracing::debug!(%session_id, "queue closed, sending close frame");
                    let _ = tokio::time::timeout(config.write_wait, conn.close()).await;
                    return Ok(());
                };

                let mut batch = vec![codec.encode(&first)?];
                while let Ok(event) = queue.try_recv() {
                    batch.push(codec.encode(&event)?);
                }
                tracing::trace!(%session_id, frames = batch.len(), "writing batch");

                tokio::time::timeout(config.write_wait, conn.send_batch(batch))
                    .await
                    .map_err(|_| SkirmishError::Timeout("write"))??;
            }
            _ = keepalive.tick() => {
                tokio::time::timeout(config.write_wait, conn.ping())
                    .await
                    .map_err(|_| SkirmishError::Timeout("write"))??;
            }
        }
    }
}

/// Sends a `rejected` event straight to the connection and closes it.
pub(crate) async fn reject<C>(
    conn: &C,
    codec: &JsonCodec,
    reason: &str,
    config: &ClientConfig,
) -> Result<(), SkirmishError>
where
    C: Connection<Error = TransportError>,
{
    let event = ServerEvent::Rejected(RejectedPayload {
        reason: reason.to_string(),
    });
    let bytes = codec.encode(&event)?;
    tokio::time::timeout(config.write_wait, conn.send(bytes))
        .await
        .map_err(|_| SkirmishError::Timeout("write"))??;
    tokio::time::timeout(config.write_wait, conn.close())
        .await
        .map_err(|_| SkirmishError::Timeout("write"))??;
    Ok(())
}
