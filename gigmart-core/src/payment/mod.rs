//! Payment oracle contract and the reconciler built on it.
//!
//! The oracle is a hosted payment-intent service with three calls: create,
//! retrieve and cancel. [`PaymentReconciler`] maps what the oracle reports
//! onto order transitions.

pub mod amount;
mod reconciler;
mod stripe;

pub use reconciler::{
    BeginPayment, CancelPayment, ConfirmPayment, PaymentError, PaymentReconciler, PaymentSession,
};
pub use stripe::StripeOracle;

use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Parameters for a new payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in the currency's minor unit (cents).
    pub amount_minor: i64,
    pub currency: String,
    /// Attached to the intent as metadata for provider-side lookups.
    pub order_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: IntentStatus,
}

/// Lifecycle state of an intent as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Unknown(String),
}

impl IntentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
            IntentStatus::Unknown(other) => other,
        }
    }
}

impl From<String> for IntentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "requires_payment_method" => IntentStatus::RequiresPaymentMethod,
            "requires_confirmation" => IntentStatus::RequiresConfirmation,
            "requires_action" => IntentStatus::RequiresAction,
            "processing" => IntentStatus::Processing,
            "requires_capture" => IntentStatus::RequiresCapture,
            "canceled" => IntentStatus::Canceled,
            "succeeded" => IntentStatus::Succeeded,
            _ => IntentStatus::Unknown(value),
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("payment provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("payment provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("payment provider rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected payment provider response: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait PaymentOracle: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, OracleError>;

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError>;

    async fn cancel_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError>;
}
