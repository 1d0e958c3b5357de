use crate::error::ErrorKind;
use dashmap::DashMap;
use gigmart_sdk::objects::{AudienceRole, ConnectionAck, ServerEnvelope, UnknownAudience};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Envelopes a single listener may have queued before it counts as dead.
pub const CONNECTION_BUFFER: usize = 64;

/// Sending half held by the registry for one listener.
pub type EnvelopeSender = mpsc::Sender<Arc<ServerEnvelope>>;
/// Receiving half drained by the listener's transport task.
pub type EnvelopeReceiver = mpsc::Receiver<Arc<ServerEnvelope>>;

/// Create the channel backing one listener connection.
pub fn connection_channel() -> (EnvelopeSender, EnvelopeReceiver) {
    mpsc::channel(CONNECTION_BUFFER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    InvalidAudience(#[from] UnknownAudience),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidAudience
    }
}

/// Outcome of one fan-out call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections the envelope was queued on.
    pub delivered: usize,
    /// Connections found dead and removed during the call.
    pub pruned: usize,
}

struct Connection {
    audience: AudienceRole,
    identity: Option<i64>,
    sender: EnvelopeSender,
}

/// Live listener connections grouped by audience.
///
/// All operations take `&self` and are safe under concurrent callers.
/// Delivery never waits on a listener: an envelope that cannot be queued
/// immediately (channel full or closed) marks that connection dead, and it
/// is removed before the call returns.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener under the audience named by `tag`.
    pub fn register(
        &self,
        tag: &str,
        identity: Option<i64>,
        sender: EnvelopeSender,
    ) -> Result<ConnectionId, RegistryError> {
        let audience: AudienceRole = tag.parse()?;
        Ok(self.register_audience(audience, identity, sender))
    }

    /// Register a listener and queue its connection acknowledgement.
    ///
    /// The acknowledgement is queued before the connection becomes visible
    /// to fan-out, so it is always the first envelope the listener sees.
    pub fn register_audience(
        &self,
        audience: AudienceRole,
        identity: Option<i64>,
        sender: EnvelopeSender,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let ack = ServerEnvelope::Connection(ConnectionAck {
            audience,
            message: format!("Connected as {audience}"),
        });
        if sender.try_send(Arc::new(ack)).is_err() {
            tracing::warn!(connection = %id, %audience, "Listener gone before registration");
            return id;
        }
        self.connections.insert(
            id,
            Connection {
                audience,
                identity,
                sender,
            },
        );
        tracing::debug!(connection = %id, %audience, ?identity, "Listener registered");
        id
    }

    /// Remove a connection. Returns whether it was still registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.remove(&id).is_some();
        if removed {
            tracing::debug!(connection = %id, "Listener unregistered");
        }
        removed
    }

    /// Deliver to every connection in `audience`.
    pub fn broadcast(&self, audience: AudienceRole, envelope: ServerEnvelope) -> Delivery {
        let targets = self.snapshot(|conn| conn.audience == audience);
        self.deliver(targets, envelope)
    }

    /// Deliver to the connections in `audience` that belong to `identity`.
    pub fn send_to_identity(
        &self,
        audience: AudienceRole,
        identity: i64,
        envelope: ServerEnvelope,
    ) -> Delivery {
        let targets =
            self.snapshot(|conn| conn.audience == audience && conn.identity == Some(identity));
        self.deliver(targets, envelope)
    }

    pub fn audience_len(&self, audience: AudienceRole) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.value().audience == audience)
            .count()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    // Copy the matching senders out so no map lock is held while sending or pruning.
    fn snapshot(&self, filter: impl Fn(&Connection) -> bool) -> Vec<(ConnectionId, EnvelopeSender)> {
        self.connections
            .iter()
            .filter(|entry| filter(entry.value()))
            .map(|entry| (*entry.key(), entry.value().sender.clone()))
            .collect()
    }

    fn deliver(&self, targets: Vec<(ConnectionId, EnvelopeSender)>, envelope: ServerEnvelope) -> Delivery {
        let kind = envelope.kind();
        let envelope = Arc::new(envelope);
        let mut delivery = Delivery::default();
        let mut dead = Vec::new();
        for (id, sender) in targets {
            match sender.try_send(envelope.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(_) => dead.push(id),
            }
        }
        for id in dead {
            if self.connections.remove(&id).is_some() {
                tracing::warn!(connection = %id, kind, "Pruned dead listener");
                delivery.pruned += 1;
            }
        }
        delivery
    }
}
