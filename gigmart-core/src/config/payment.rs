//! Payment provider configuration.

use std::time::Duration;
use url::Url;

/// Settings for the hosted payment-intent provider.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    /// Secret API key sent as a bearer credential.
    pub secret_key: String,
    /// Provider API root, e.g. `https://api.stripe.com/v1/`.
    pub api_base: Url,
    /// Lowercase ISO 4217 code intents are created in.
    pub currency: String,
    /// Upper bound on every provider call.
    pub timeout: Duration,
}
