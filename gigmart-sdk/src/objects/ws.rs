//! WebSocket message types for the live notification channel.
//!
//! The `GET /ws/auth/{token}` endpoint upgrades to a WebSocket connection
//! and pushes [`ServerEnvelope`] JSON frames.
//!
//! # Protocol
//!
//! 1. The server authenticates the token, registers the connection under
//!    the principal's audience and sends a [`ServerEnvelope::Connection`]
//!    acknowledgement.
//! 2. Zero or more event envelopes follow. The listener is not expected to
//!    answer; text frames it sends are ignored.
//! 3. If the audience tag is unknown, authentication fails, or the audience
//!    does not match the principal, the server closes with an
//!    application-defined close code (see [`WsCloseCode`]).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::AudienceRole;

/// Server-to-listener envelope.
///
/// Serialized as an adjacently-tagged JSON object so the listener can
/// dispatch on the `"kind"` field:
///
/// ```json
/// {"kind":"new_order","data":{ ... }}
/// {"kind":"payment_status","data":{"order_id":"...","status":"paid"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ServerEnvelope {
    /// One-time acknowledgement sent right after registration.
    Connection(ConnectionAck),
    /// A client posted a new order. Sent to all workers.
    NewOrder(NewOrderNotice),
    /// A worker took the order. Sent to the order's client.
    OrderAccepted(OrderAcceptedNotice),
    /// The order's payment moved. Sent to the order's client.
    PaymentStatus(PaymentStatusNotice),
}

impl ServerEnvelope {
    /// The wire `kind` tag of this envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEnvelope::Connection(_) => "connection",
            ServerEnvelope::NewOrder(_) => "new_order",
            ServerEnvelope::OrderAccepted(_) => "order_accepted",
            ServerEnvelope::PaymentStatus(_) => "payment_status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionAck {
    pub audience: AudienceRole,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderNotice {
    pub order_id: Uuid,
    pub service_id: i64,
    pub service_name: String,
    pub category: String,
    pub amount: rust_decimal::Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAcceptedNotice {
    pub order_id: Uuid,
    pub worker_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusNotice {
    pub order_id: Uuid,
    pub status: PaymentStatusKind,
}

/// Payment milestones announced to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatusKind {
    PaymentCreated,
    Paid,
    Canceled,
}

/// Well-known WebSocket close codes used by the notification channel.
///
/// Codes in the 4000–4999 range are reserved for application use by
/// [RFC 6455 §7.4.2](https://www.rfc-editor.org/rfc/rfc6455#section-7.4.2).
pub struct WsCloseCode;

impl WsCloseCode {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;

    /// An unexpected server-side error prevented the connection from
    /// continuing.
    pub const INTERNAL_ERROR: u16 = 1011;

    /// The audience tag is not one of the recognized categories.
    pub const INVALID_AUDIENCE: u16 = 4000;

    /// The token could not be authenticated.
    pub const AUTHENTICATION_FAILED: u16 = 4001;

    /// The requested audience does not belong to the principal's role.
    pub const AUDIENCE_MISMATCH: u16 = 4003;
}
