//! TOML file configuration structures.
//!
//! These structs directly map to the `gigmart-config.toml` file format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    /// Seed listings for the in-memory catalog.
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// Bearer token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the credential service.
    pub token_secret: String,
    #[serde(default = "default_token_max_age")]
    pub token_max_age_secs: i64,
}

fn default_token_max_age() -> i64 {
    gigmart_sdk::token::DEFAULT_MAX_TOKEN_AGE
}

/// Payment provider section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret key. `STRIPE_SECRET_KEY` takes precedence.
    #[serde(default)]
    pub stripe_secret_key: String,
    #[serde(default = "default_api_base")]
    pub api_base: Url,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: String::new(),
            api_base: default_api_base(),
            currency: default_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> Url {
    Url::parse("https://api.stripe.com/v1/").expect("valid default api base")
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// A catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
