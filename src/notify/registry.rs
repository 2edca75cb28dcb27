//! In-memory index of live connections per user
//!
//! A user may hold any number of connections (one per browser tab). Each
//! connection is a bounded channel; `broadcast` never waits on a slow reader.
//! The registry is per-process: a broadcast reaches only connections held by
//! this instance.

use crate::core::{NotificationPayload, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Identifies one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Sending half of a live connection
#[derive(Debug, Clone)]
pub struct LiveConnection {
    pub id: ConnectionId,
    sender: mpsc::Sender<NotificationPayload>,
}

impl LiveConnection {
    #[must_use]
    pub const fn new(id: ConnectionId, sender: mpsc::Sender<NotificationPayload>) -> Self {
        Self { id, sender }
    }
}

type Channels = HashMap<UserId, HashMap<ConnectionId, mpsc::Sender<NotificationPayload>>>;

#[derive(Debug)]
struct Inner {
    channels: RwLock<Channels>,
    next_id: AtomicU64,
    capacity: usize,
}

/// Registry of live connections, cheap to clone
#[derive(Debug, Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<Inner>,
}

impl SubscriptionRegistry {
    /// `capacity` is the number of undelivered payloads buffered per connection
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                channels: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Allocates a fresh connection id
    #[must_use]
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `connection` under `user_id`
    pub fn subscribe(&self, user_id: &UserId, connection: LiveConnection) {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(user_id.clone())
            .or_default()
            .insert(connection.id, connection.sender);
        debug!(user = %user_id, connection = %connection.id, "subscribed");
    }

    /// Removes a connection; unknown connections are ignored
    pub fn unsubscribe(&self, user_id: &UserId, connection_id: ConnectionId) {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(connections) = channels.get_mut(user_id) {
            if connections.remove(&connection_id).is_some() {
                debug!(user = %user_id, connection = %connection_id, "unsubscribed");
            }
            if connections.is_empty() {
                channels.remove(user_id);
            }
        }
    }

    /// Opens a connection for `user_id` and registers it
    ///
    /// The returned [`Subscription`] unsubscribes when dropped.
    #[must_use]
    pub fn connect(&self, user_id: &UserId) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        let id = self.next_connection_id();
        self.subscribe(user_id, LiveConnection::new(id, sender));
        Subscription {
            user_id: user_id.clone(),
            connection_id: id,
            receiver,
            registry: self.clone(),
        }
    }

    /// Delivers `payload` to every connection of `user_id`
    ///
    /// Returns how many connections accepted it. Full channels drop this
    /// payload, closed channels are pruned.
    pub fn broadcast(&self, user_id: &UserId, payload: &NotificationPayload) -> usize {
        let targets: Vec<_> = {
            let channels = self
                .inner
                .channels
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match channels.get(user_id) {
                Some(connections) => connections
                    .iter()
                    .map(|(id, sender)| (*id, sender.clone()))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (connection_id, sender) in targets {
            match sender.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(user = %user_id, connection = %connection_id, "connection backlog full, dropping notification");
                },
                Err(TrySendError::Closed(_)) => self.unsubscribe(user_id, connection_id),
            }
        }
        delivered
    }

    /// Number of live connections held by `user_id`
    #[must_use]
    pub fn connection_count(&self, user_id: &UserId) -> usize {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .map_or(0, HashMap::len)
    }
}

/// Receiving half of a registered connection
#[derive(Debug)]
pub struct Subscription {
    user_id: UserId,
    connection_id: ConnectionId,
    receiver: mpsc::Receiver<NotificationPayload>,
    registry: SubscriptionRegistry,
}

impl Subscription {
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Waits for the next payload
    pub async fn recv(&mut self) -> Option<NotificationPayload> {
        self.receiver.recv().await
    }

    /// Returns a payload if one is already buffered
    pub fn try_recv(&mut self) -> Option<NotificationPayload> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.user_id, self.connection_id);
    }
}
