//! Application state shared across all request handlers.

use gigmart_core::auth::{Authenticator, TokenAuthenticator};
use gigmart_core::config::SharedConfig;
use gigmart_core::lifecycle::OrderLifecycle;
use gigmart_core::notify::{ConnectionRegistry, NotificationBroker};
use gigmart_core::payment::{PaymentOracle, PaymentReconciler};
use gigmart_core::store::{OrderStore, ServiceCatalog};
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Configuration sections (auth and payment reload via SIGHUP).
    pub config: SharedConfig,
    pub authenticator: Arc<dyn Authenticator>,
    pub lifecycle: OrderLifecycle,
    pub reconciler: PaymentReconciler,
    /// Live listener connections.
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Wire the core subsystem over the given store, catalog and oracle.
    pub fn new(
        config: SharedConfig,
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ServiceCatalog>,
        oracle: Arc<dyn PaymentOracle>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broker = NotificationBroker::new(registry.clone());
        let lifecycle = OrderLifecycle::new(orders, catalog, broker);
        let reconciler =
            PaymentReconciler::new(oracle, lifecycle.clone(), config.payment.clone());
        let authenticator = Arc::new(TokenAuthenticator::new(config.auth.clone()));
        Self {
            config,
            authenticator,
            lifecycle,
            reconciler,
            registry,
        }
    }
}
