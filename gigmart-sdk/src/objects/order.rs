//! Order request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `gigmart-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
    Completed,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Canceled => write!(f, "canceled"),
            OrderStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Request body for `POST /api/v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub service_id: i64,
}

/// Request body for confirming or canceling a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub payment_intent_id: String,
}

/// Returned when a payment attempt begins.
///
/// The `client_secret` is handed to the payment provider's frontend SDK.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionResponse {
    pub order_id: Uuid,
    pub payment_intent_id: String,
    pub client_secret: String,
}

/// Full order state as seen by API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub client_id: i64,
    pub worker_id: Option<i64>,
    pub service_id: i64,
    pub status: OrderStatus,
    pub amount: rust_decimal::Decimal,
    pub payment_intent_id: Option<String>,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp of the last mutation.
    pub updated_at: i64,
}

/// Offset/limit query string shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}
