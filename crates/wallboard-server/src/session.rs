//! Per-terminal connection session: the duplex message pump.
//!
//! Each connected terminal runs two tasks sharing only the outbound queue
//! and the split transport:
//!
//! - the **read pump** enforces a sliding keepalive window, touches the
//!   client record on any inbound traffic, decodes `{action, data}`
//!   envelopes and dispatches them;
//! - the **write pump** drains the outbound queue under a write deadline
//!   and sends liveness pings.
//!
//! Teardown is the unregister+close pair, applied exactly once whatever
//! path the read pump exits through: unregistering drops the broker's
//! queue sender, the write pump sees the queue close and shuts the
//! transport.

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use wallboard_core::timing::{
    MAX_MESSAGE_SIZE, OUTBOUND_QUEUE_SIZE, PING_INTERVAL, PONG_WAIT, WRITE_WAIT,
};
use wallboard_core::{ClientIdentity, Envelope, InboundAction};
use wallboard_store::Store;

use crate::broker::{BrokerHandle, ConnectionId, SessionHandle};
use crate::errors::SessionError;

/// Drive one terminal's connection until it dies.
///
/// Registers with the broker, runs both pumps, and guarantees
/// deregistration on every exit path.
pub async fn run(store: Store, broker: BrokerHandle, identity: ClientIdentity, ip: String, socket: WebSocket) {
    let conn_id = broker.next_connection_id();
    let (queue_tx, queue_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
    broker
        .register(
            SessionHandle {
                conn_id,
                identity: identity.clone(),
                queue: queue_tx,
            },
            ip,
        )
        .await;

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_pump(identity.clone(), sink, queue_rx));

    let session = Session {
        conn_id,
        identity,
        store,
        broker,
    };
    session.read_pump(stream).await;

    // Guaranteed cleanup: dropping the broker's sender closes the queue,
    // which in turn makes the write pump close the transport.
    session.broker.unregister(conn_id).await;
    let _ = writer.await;
}

struct Session {
    conn_id: ConnectionId,
    identity: ClientIdentity,
    store: Store,
    broker: BrokerHandle,
}

impl Session {
    /// Receive until a fatal condition: keepalive expiry, transport error,
    /// oversized frame, or an undecodable envelope.
    async fn read_pump(&self, mut stream: SplitStream<WebSocket>) {
        let client = self.identity.name();
        let mut controller = false;

        loop {
            // Sliding window: the deadline restarts on every frame.
            let msg = match timeout(PONG_WAIT, stream.next()).await {
                Err(_) => {
                    warn!(client, "keepalive window expired");
                    break;
                }
                Ok(None) => {
                    debug!(client, "connection closed by peer");
                    break;
                }
                Ok(Some(Err(e))) => {
                    debug!(client, error = %e, "transport error");
                    break;
                }
                Ok(Some(Ok(msg))) => msg,
            };

            // Any inbound traffic counts as liveness.
            self.touch();

            match msg {
                Message::Text(text) => {
                    if text.len() > MAX_MESSAGE_SIZE {
                        warn!(client, size = text.len(), "inbound message too large");
                        break;
                    }
                    let envelope: Envelope = match serde_json::from_str(text.as_str()) {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            warn!(client, error = %e, "undecodable envelope");
                            break;
                        }
                    };
                    for reply in self.respond(envelope.inbound_action(), &mut controller).await {
                        self.broker.send_to(self.conn_id, reply).await;
                    }
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(_) => {
                    warn!(client, "unexpected binary frame");
                    break;
                }
                Message::Close(_) => {
                    debug!(client, "close frame received");
                    break;
                }
            }
        }
    }

    /// Compute the replies to one inbound action.
    async fn respond(&self, action: InboundAction, controller: &mut bool) -> Vec<Envelope> {
        let client = self.identity.name();
        match action {
            InboundAction::FlagController => {
                *controller = true;
                info!(client, "session flagged as controller");
                vec![
                    Envelope::update_urls(self.store.resolve_urls(client)),
                    Envelope::update_clients(self.broker.live_clients().await),
                ]
            }
            InboundAction::SendUrls => {
                debug!(client, "urls requested");
                vec![Envelope::update_urls(self.store.resolve_urls(client))]
            }
            InboundAction::SendClients => {
                debug!(client, "client list requested");
                vec![Envelope::update_clients(self.broker.live_clients().await)]
            }
            InboundAction::Unknown(action) => {
                warn!(client, action = %action, "unrecognized action");
                Vec::new()
            }
        }
    }

    fn touch(&self) {
        if let ClientIdentity::Registered(id) = &self.identity
            && let Err(e) = self.store.touch_client(id)
        {
            debug!(client = %id, error = %e, "touch failed");
        }
    }
}

/// Drain the outbound queue to the wire and probe liveness.
///
/// Exits when the queue closes (the broker dropped its sender) or a write
/// fails its deadline; either way the transport is closed on the way out.
async fn write_pump(
    identity: ClientIdentity,
    mut sink: SplitSink<WebSocket, Message>,
    mut queue: mpsc::Receiver<Envelope>,
) {
    let client = identity.name();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // interval yields immediately on first poll
    ping.tick().await;

    loop {
        tokio::select! {
            message = queue.recv() => match message {
                Some(envelope) => {
                    if let Err(e) = write_envelope(&mut sink, &envelope).await {
                        debug!(client, error = %e, "write failed");
                        break;
                    }
                    debug!(client, action = %envelope.action, "message sent");
                }
                None => {
                    let _ = timeout(WRITE_WAIT, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ping.tick() => {
                if write_frame(&mut sink, Message::Ping(Vec::new().into())).await.is_err() {
                    debug!(client, "ping failed");
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

async fn write_envelope(
    sink: &mut SplitSink<WebSocket, Message>,
    envelope: &Envelope,
) -> Result<(), SessionError> {
    let text = serde_json::to_string(envelope)?;
    write_frame(sink, Message::Text(text.into())).await
}

async fn write_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: Message,
) -> Result<(), SessionError> {
    match timeout(WRITE_WAIT, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionError::Transport(e.to_string())),
        Err(_) => Err(SessionError::WriteTimeout),
    }
}
