/**
 * Connection Hub
 *
 * The hub is the only owner of "who is connected". It runs as a single task
 * that receives commands over an unbounded channel and applies them one at a
 * time, in arrival order, so the session set and the user mapping need no
 * locks.
 *
 * # State
 *
 * - `sessions`: session id -> entry (owning user, outbound queue sender,
 *   close signal sender)
 * - `users`: user id -> ids of that user's live sessions
 *
 * Every session appears under exactly one user, and no user entry names a
 * session that has been removed. Removing an entry drops the only senders of
 * its outbound queue and close signal, which is how the session's loops learn
 * they have been unregistered.
 *
 * # Backpressure
 *
 * Outbound queues are bounded. A session whose queue is full when an event
 * is dispatched is evicted on the spot instead of blocking the hub. Evictions
 * found during a fanout are processed once that fanout finishes, each one
 * going through the normal unregister path.
 */

use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

use crate::shared::messaging::UserId;
use crate::shared::{PresenceStatus, RealtimeEvent};

/// Identifier of one live connection
pub type SessionId = Uuid;

/// A serialized event as queued for a session's writer
pub type OutboundFrame = Utf8Bytes;

/// Presence change the hub wants persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub user_id: UserId,
    pub status: PresenceStatus,
    pub at: DateTime<Utc>,
}

/// Hub-side half of a session: the senders the hub owns
#[derive(Debug)]
pub struct SessionEntry {
    id: SessionId,
    user_id: UserId,
    outbound: mpsc::Sender<OutboundFrame>,
    close: watch::Sender<()>,
}

impl SessionEntry {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Session-side half: the outbound queue receiver and the close signal
#[derive(Debug)]
pub struct SessionMailbox {
    pub id: SessionId,
    pub user_id: UserId,
    pub outbound: mpsc::Receiver<OutboundFrame>,
    pub closed: watch::Receiver<()>,
}

impl SessionMailbox {
    /// True once the hub has dropped this session
    pub fn is_closed(&self) -> bool {
        self.closed.has_changed().is_err()
    }
}

/// Create both halves of a new session with a bounded outbound queue
pub fn new_session(user_id: UserId, capacity: usize) -> (SessionEntry, SessionMailbox) {
    let id = Uuid::new_v4();
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity.max(1));
    let (close_tx, close_rx) = watch::channel(());
    (
        SessionEntry {
            id,
            user_id,
            outbound: outbound_tx,
            close: close_tx,
        },
        SessionMailbox {
            id,
            user_id,
            outbound: outbound_rx,
            closed: close_rx,
        },
    )
}

/// Point-in-time view of the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HubSnapshot {
    /// Every live session and its owner
    pub sessions: HashMap<SessionId, UserId>,
    /// The user mapping as the hub holds it
    pub users: HashMap<UserId, HashSet<SessionId>>,
}

impl HubSnapshot {
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn connected_users(&self) -> usize {
        self.users.len()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Mapping and session set agree in both directions
    pub fn is_consistent(&self) -> bool {
        let mapped: usize = self.users.values().map(HashSet::len).sum();
        if mapped != self.sessions.len() {
            return false;
        }
        let mapping_ok = self.users.iter().all(|(user_id, ids)| {
            !ids.is_empty()
                && ids
                    .iter()
                    .all(|id| self.sessions.get(id) == Some(user_id))
        });
        let sessions_ok = self.sessions.iter().all(|(id, user_id)| {
            self.users
                .get(user_id)
                .is_some_and(|ids| ids.contains(id))
        });
        mapping_ok && sessions_ok
    }
}

enum HubCommand {
    Register(SessionEntry),
    Unregister(SessionId),
    Dispatch {
        event: RealtimeEvent,
        targets: Vec<UserId>,
    },
    Broadcast(RealtimeEvent),
    Snapshot(oneshot::Sender<HubSnapshot>),
}

/// Cheap, cloneable handle for submitting requests to the hub
///
/// All request methods return immediately; the hub applies them in the
/// order they were submitted.
#[derive(Clone, Debug)]
pub struct HubHandle {
    tx: mpsc::UnboundedSender<HubCommand>,
}

impl std::fmt::Debug for HubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HubCommand::Register(entry) => write!(f, "Register({})", entry.id),
            HubCommand::Unregister(id) => write!(f, "Unregister({})", id),
            HubCommand::Dispatch { event, targets } => {
                write!(f, "Dispatch({}, {} targets)", event.kind(), targets.len())
            }
            HubCommand::Broadcast(event) => write!(f, "Broadcast({})", event.kind()),
            HubCommand::Snapshot(_) => f.write_str("Snapshot"),
        }
    }
}

impl HubHandle {
    /// Add a session and announce its user as online
    pub fn register(&self, entry: SessionEntry) {
        self.submit(HubCommand::Register(entry));
    }

    /// Remove a session; a no-op if it is already gone
    pub fn unregister(&self, session_id: SessionId) {
        self.submit(HubCommand::Unregister(session_id));
    }

    /// Enqueue an event on every live session of the given users
    pub fn dispatch(&self, event: RealtimeEvent, targets: impl IntoIterator<Item = UserId>) {
        self.submit(HubCommand::Dispatch {
            event,
            targets: targets.into_iter().collect(),
        });
    }

    /// Enqueue an event on every live session
    pub fn broadcast(&self, event: RealtimeEvent) {
        self.submit(HubCommand::Broadcast(event));
    }

    /// Current registry contents, or `None` if the hub has stopped
    pub async fn snapshot(&self) -> Option<HubSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(HubCommand::Snapshot(reply_tx));
        reply_rx.await.ok()
    }

    fn submit(&self, command: HubCommand) {
        if let Err(err) = self.tx.send(command) {
            tracing::warn!("[Hub] Hub is not running, dropped {:?}", err.0);
        }
    }
}

/// The registry itself; lives inside the hub task
pub struct Hub {
    sessions: HashMap<SessionId, SessionEntry>,
    users: HashMap<UserId, HashSet<SessionId>>,
    presence: Option<mpsc::UnboundedSender<PresenceUpdate>>,
}

impl Hub {
    /// Start the hub task
    ///
    /// Presence changes are forwarded, in order, to `presence` when given.
    pub fn spawn(presence: Option<mpsc::UnboundedSender<PresenceUpdate>>) -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Hub {
            sessions: HashMap::new(),
            users: HashMap::new(),
            presence,
        };
        tokio::spawn(hub.run(rx));
        tracing::info!("[Hub] Connection hub started");
        HubHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<HubCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        tracing::info!(
            "[Hub] All handles dropped, stopping with {} live sessions",
            self.sessions.len()
        );
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(entry) => self.register(entry),
            HubCommand::Unregister(session_id) => self.disconnect(session_id),
            HubCommand::Dispatch { event, targets } => {
                let recipients = self.sessions_of(targets);
                let evicted = self.fanout(&event, recipients);
                self.evict(evicted);
            }
            HubCommand::Broadcast(event) => {
                let recipients: Vec<SessionId> = self.sessions.keys().copied().collect();
                let evicted = self.fanout(&event, recipients);
                self.evict(evicted);
            }
            HubCommand::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    fn register(&mut self, entry: SessionEntry) {
        let (session_id, user_id) = (entry.id, entry.user_id);
        if self.sessions.contains_key(&session_id) {
            tracing::warn!("[Hub] Session {} is already registered", session_id);
            return;
        }

        self.sessions.insert(session_id, entry);
        self.users.entry(user_id).or_default().insert(session_id);
        tracing::info!(
            "[Hub] Client connected: user {} (session {}, {} sessions live)",
            user_id,
            session_id,
            self.sessions.len()
        );

        self.record_presence(user_id, PresenceStatus::Online);
        let recipients: Vec<SessionId> = self.sessions.keys().copied().collect();
        let evicted = self.fanout(&RealtimeEvent::presence(user_id, PresenceStatus::Online), recipients);
        self.evict(evicted);
    }

    /// Unregister one session and announce its user as offline
    ///
    /// The offline broadcast can itself overflow other queues, so removals
    /// are worked off a queue rather than recursively.
    fn disconnect(&mut self, session_id: SessionId) {
        let mut pending = vec![session_id];
        while let Some(session_id) = pending.pop() {
            let Some(user_id) = self.remove(session_id) else {
                continue;
            };
            tracing::info!(
                "[Hub] Client disconnected: user {} (session {})",
                user_id,
                session_id
            );

            self.record_presence(user_id, PresenceStatus::Offline);
            let recipients: Vec<SessionId> = self.sessions.keys().copied().collect();
            let evicted =
                self.fanout(&RealtimeEvent::presence(user_id, PresenceStatus::Offline), recipients);
            pending.extend(evicted);
        }
    }

    fn evict(&mut self, evicted: Vec<SessionId>) {
        for session_id in evicted {
            self.disconnect(session_id);
        }
    }

    /// Drop a session from both maps; returns its owner if it was present
    fn remove(&mut self, session_id: SessionId) -> Option<UserId> {
        let entry = self.sessions.remove(&session_id)?;
        if let Some(ids) = self.users.get_mut(&entry.user_id) {
            ids.remove(&session_id);
            if ids.is_empty() {
                self.users.remove(&entry.user_id);
            }
        }
        // Dropping the entry closes the outbound queue and fires the close signal.
        drop(entry.close);
        Some(entry.user_id)
    }

    fn sessions_of(&self, targets: Vec<UserId>) -> Vec<SessionId> {
        let unique: HashSet<UserId> = targets.into_iter().collect();
        unique
            .iter()
            .filter_map(|user_id| self.users.get(user_id))
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }

    /// Enqueue one event on each recipient; returns the sessions that overflowed
    fn fanout(&mut self, event: &RealtimeEvent, recipients: Vec<SessionId>) -> Vec<SessionId> {
        if recipients.is_empty() {
            return Vec::new();
        }
        let frame: OutboundFrame = match serde_json::to_string(event) {
            Ok(text) => text.into(),
            Err(e) => {
                tracing::error!("[Hub] Failed to serialize {} event: {:?}", event.kind(), e);
                return Vec::new();
            }
        };

        let mut evicted = Vec::new();
        for session_id in recipients {
            let Some(entry) = self.sessions.get(&session_id) else {
                continue;
            };
            match entry.outbound.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        "[Hub] Outbound queue full for session {} (user {}), disconnecting",
                        session_id,
                        entry.user_id
                    );
                    evicted.push(session_id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        "[Hub] Session {} stopped reading its queue, disconnecting",
                        session_id
                    );
                    evicted.push(session_id);
                }
            }
        }
        tracing::debug!("[Hub] Fanned out {} event", event.kind());
        evicted
    }

    fn record_presence(&self, user_id: UserId, status: PresenceStatus) {
        let Some(presence) = &self.presence else {
            return;
        };
        let update = PresenceUpdate {
            user_id,
            status,
            at: Utc::now(),
        };
        if presence.send(update).is_err() {
            tracing::warn!("[Hub] Presence writer is gone, user {} {} not persisted", user_id, status);
        }
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            sessions: self
                .sessions
                .iter()
                .map(|(id, entry)| (*id, entry.user_id))
                .collect(),
            users: self.users.clone(),
        }
    }
}
