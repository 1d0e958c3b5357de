//! Configuration types for Gigmart.
//!
//! These types represent the validated runtime configuration used by the server
//! and can be shared across crates. The actual config loading/parsing is handled
//! by the server crate.

mod auth;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use payment::PaymentConfig;
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
///
/// This allows independent access to different configuration sections
/// without blocking other readers/writers.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Token verification settings.
    pub auth: Arc<RwLock<AuthConfig>>,
    /// Payment provider settings.
    pub payment: Arc<RwLock<PaymentConfig>>,
}

impl SharedConfig {
    pub fn new(server: ServerConfig, auth: AuthConfig, payment: PaymentConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            auth: Arc::new(RwLock::new(auth)),
            payment: Arc::new(RwLock::new(payment)),
        }
    }
}
