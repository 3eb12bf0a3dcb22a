//! The broker — single authority over the live-session set.
//!
//! One actor task owns the session map; registration, deregistration,
//! direct sends, broadcasts, and the reconciliation tick all flow through
//! its command channel, so mutations are totally ordered and no other task
//! ever touches the set. Fan-out is non-blocking: a session whose outbound
//! queue is full is treated as dead and dropped, and delivery to the rest
//! continues.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use wallboard_core::timing::URL_POLL_INTERVAL;
use wallboard_core::{ClientIdentity, Envelope};
use wallboard_store::Store;

/// Unique id of one live connection. Identities are not unique across
/// reconnects, so the map is keyed by this instead.
pub type ConnectionId = u64;

/// Broker-side view of one live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub conn_id: ConnectionId,
    pub identity: ClientIdentity,
    /// Bounded outbound queue feeding the session's write pump. The broker
    /// holds the only sender; removal from the map is the single close.
    pub queue: mpsc::Sender<Envelope>,
}

enum BrokerCommand {
    Register {
        session: SessionHandle,
        ip_address: String,
    },
    Unregister {
        conn_id: ConnectionId,
    },
    Send {
        conn_id: ConnectionId,
        message: Envelope,
    },
    Broadcast(Envelope),
    LiveClients(oneshot::Sender<Vec<String>>),
    ConnectionCount(oneshot::Sender<usize>),
    Tick,
}

/// Cheap cloneable handle submitting commands to the broker task.
#[derive(Clone)]
pub struct BrokerHandle {
    tx: mpsc::Sender<BrokerCommand>,
    next_conn_id: Arc<AtomicU64>,
}

impl BrokerHandle {
    /// Allocate a connection id for a new session.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_conn_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Admit a session into the live set.
    pub async fn register(&self, session: SessionHandle, ip_address: String) {
        let _ = self
            .tx
            .send(BrokerCommand::Register {
                session,
                ip_address,
            })
            .await;
    }

    /// Remove a session from the live set. Idempotent.
    pub async fn unregister(&self, conn_id: ConnectionId) {
        let _ = self.tx.send(BrokerCommand::Unregister { conn_id }).await;
    }

    /// Enqueue one message for one session.
    pub async fn send_to(&self, conn_id: ConnectionId, message: Envelope) {
        let _ = self.tx.send(BrokerCommand::Send { conn_id, message }).await;
    }

    /// Best-effort fan-out to every live session.
    pub async fn broadcast(&self, message: Envelope) {
        let _ = self.tx.send(BrokerCommand::Broadcast(message)).await;
    }

    /// Identifiers of live, registered (non-anonymous) sessions.
    pub async fn live_clients(&self) -> Vec<String> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(BrokerCommand::LiveClients(reply)).await;
        rx.await.unwrap_or_default()
    }

    /// Number of live sessions, anonymous included.
    pub async fn connection_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(BrokerCommand::ConnectionCount(reply)).await;
        rx.await.unwrap_or(0)
    }

    /// Force a reconciliation pass outside the timer.
    pub async fn tick(&self) {
        let _ = self.tx.send(BrokerCommand::Tick).await;
    }
}

/// The broker actor. Owns the live-session map; runs until every handle
/// is dropped.
pub struct Broker {
    store: Store,
    sessions: HashMap<ConnectionId, SessionHandle>,
    rx: mpsc::Receiver<BrokerCommand>,
}

impl Broker {
    /// Spawn the broker task and return its handle.
    pub fn spawn(store: Store) -> BrokerHandle {
        let (tx, rx) = mpsc::channel(64);
        let broker = Self {
            store,
            sessions: HashMap::new(),
            rx,
        };
        let _ = tokio::spawn(broker.run());
        BrokerHandle {
            tx,
            next_conn_id: Arc::new(AtomicU64::new(1)),
        }
    }

    async fn run(mut self) {
        let mut tick = tokio::time::interval(URL_POLL_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval yields immediately on first poll
        tick.tick().await;

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                _ = tick.tick() => self.reconcile(),
            }
        }
        debug!("broker loop stopped");
    }

    fn handle(&mut self, cmd: BrokerCommand) {
        match cmd {
            BrokerCommand::Register {
                session,
                ip_address,
            } => self.register(session, &ip_address),
            BrokerCommand::Unregister { conn_id } => self.unregister(conn_id),
            BrokerCommand::Send { conn_id, message } => {
                let blocked = self
                    .sessions
                    .get(&conn_id)
                    .is_some_and(|session| session.queue.try_send(message).is_err());
                if blocked {
                    warn!(conn_id, "outbound queue blocked, dropping session");
                    self.unregister(conn_id);
                }
            }
            BrokerCommand::Broadcast(message) => self.fan_out(&message, "broadcast"),
            BrokerCommand::LiveClients(reply) => {
                let _ = reply.send(self.live_clients());
            }
            BrokerCommand::ConnectionCount(reply) => {
                let _ = reply.send(self.sessions.len());
            }
            BrokerCommand::Tick => self.reconcile(),
        }
    }

    fn register(&mut self, session: SessionHandle, ip_address: &str) {
        info!(client = session.identity.name(), ip = ip_address, "adding session");

        if let ClientIdentity::Registered(id) = &session.identity {
            // A store fault never refuses the terminal; it keeps its
            // in-memory identity and resolution serves the catalog.
            match self.store.upsert_client(id, ip_address) {
                Ok(row) => {
                    debug!(client = %id, last_ping = %row.last_ping, "client record refreshed");
                }
                Err(e) => {
                    warn!(client = %id, error = %e, "client bookkeeping failed, continuing unpersisted");
                }
            }
        } else {
            debug!(client = session.identity.name(), "anonymous session, skipping persistence");
        }

        let _ = self.sessions.insert(session.conn_id, session);
    }

    /// Dropping the handle releases the broker's queue sender; the write
    /// pump sees the close and shuts the transport. Repeat calls no-op.
    fn unregister(&mut self, conn_id: ConnectionId) {
        if let Some(session) = self.sessions.remove(&conn_id) {
            info!(client = session.identity.name(), "removing session");
        }
    }

    fn fan_out(&mut self, message: &Envelope, label: &str) {
        let mut dead = Vec::new();
        for session in self.sessions.values() {
            if session.queue.try_send(message.clone()).is_err() {
                warn!(client = session.identity.name(), label, "outbound queue blocked, dropping session");
                dead.push(session.conn_id);
            } else {
                debug!(client = session.identity.name(), action = %message.action, label, "queued message");
            }
        }
        for conn_id in dead {
            self.unregister(conn_id);
        }
    }

    /// Push a freshly resolved URL set to every live session.
    fn reconcile(&mut self) {
        debug!(sessions = self.sessions.len(), "reconciling URL sets");

        let mut dead = Vec::new();
        for session in self.sessions.values() {
            let urls = self.store.resolve_urls(session.identity.name());
            if session.queue.try_send(Envelope::update_urls(urls)).is_err() {
                warn!(client = session.identity.name(), "outbound queue blocked during tick, dropping session");
                dead.push(session.conn_id);
            }
        }
        for conn_id in dead {
            self.unregister(conn_id);
        }
    }

    fn live_clients(&self) -> Vec<String> {
        let mut clients: Vec<String> = self
            .sessions
            .values()
            .filter(|s| !s.identity.is_anonymous())
            .map(|s| s.identity.name().to_string())
            .collect();
        clients.sort();
        clients
    }
}
