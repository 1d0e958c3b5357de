//! Live notification fan-out.
//!
//! [`ConnectionRegistry`] owns the set of live listener channels;
//! [`NotificationBroker`] turns order events into envelopes and picks who
//! receives them.

mod broker;
mod registry;

pub use broker::NotificationBroker;
pub use registry::{
    CONNECTION_BUFFER, ConnectionId, ConnectionRegistry, Delivery, EnvelopeReceiver,
    EnvelopeSender, RegistryError, connection_channel,
};
