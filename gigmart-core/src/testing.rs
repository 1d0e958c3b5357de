//! Test doubles and a wired-up core for unit tests.

use crate::config::PaymentConfig;
use crate::entities::order_records::OrderRecord;
use crate::entities::service_listings::ServiceListing;
use crate::lifecycle::{CreateOrder, OrderLifecycle};
use crate::notify::{ConnectionRegistry, EnvelopeReceiver, NotificationBroker, connection_channel};
use crate::payment::{
    IntentRequest, IntentStatus, OracleError, PaymentIntent, PaymentOracle, PaymentReconciler,
};
use crate::store::MemoryStore;
use gigmart_sdk::objects::{AudienceRole, UserRole};
use gigmart_sdk::token::Principal;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

pub(crate) fn client(identity: i64) -> Principal {
    Principal::new(identity, UserRole::Client)
}

pub(crate) fn worker(identity: i64) -> Principal {
    Principal::new(identity, UserRole::Worker)
}

pub(crate) fn admin(identity: i64) -> Principal {
    Principal::new(identity, UserRole::Admin)
}

pub(crate) fn catalog() -> Vec<ServiceListing> {
    vec![
        ServiceListing {
            id: 1,
            name: "Web Development".to_string(),
            description: "Full-stack web application development".to_string(),
            price: Decimal::new(50000, 2),
            category: "Technology".to_string(),
            is_active: true,
        },
        ServiceListing {
            id: 2,
            name: "Content Writing".to_string(),
            description: "Articles and blog posts".to_string(),
            price: Decimal::new(1505, 1),
            category: "Writing".to_string(),
            is_active: true,
        },
        ServiceListing {
            id: 3,
            name: "Logo Design".to_string(),
            description: "Retired listing".to_string(),
            price: Decimal::new(20000, 2),
            category: "Design".to_string(),
            is_active: false,
        },
    ]
}

#[derive(Default)]
struct OracleState {
    queued_ids: VecDeque<String>,
    intents: HashMap<String, IntentStatus>,
    created: Vec<IntentRequest>,
    canceled: Vec<String>,
    issued: u64,
    fail_create: bool,
    fail_retrieve: bool,
    fail_cancel: bool,
    withhold_secret: bool,
    delay: Option<Duration>,
}

/// In-memory payment oracle whose answers tests control.
#[derive(Default)]
pub(crate) struct ScriptedOracle {
    state: Mutex<OracleState>,
}

impl ScriptedOracle {
    /// Id handed out by the next create.
    pub fn queue_id(&self, id: &str) {
        self.state.lock().unwrap().queued_ids.push_back(id.to_string());
    }

    pub fn set_status(&self, id: &str, status: IntentStatus) {
        self.state
            .lock()
            .unwrap()
            .intents
            .insert(id.to_string(), status);
    }

    pub fn status(&self, id: &str) -> Option<IntentStatus> {
        self.state.lock().unwrap().intents.get(id).cloned()
    }

    pub fn fail_create(&self, fail: bool) {
        self.state.lock().unwrap().fail_create = fail;
    }

    pub fn fail_retrieve(&self, fail: bool) {
        self.state.lock().unwrap().fail_retrieve = fail;
    }

    pub fn fail_cancel(&self, fail: bool) {
        self.state.lock().unwrap().fail_cancel = fail;
    }

    /// Created intents come back without a client secret.
    pub fn withhold_secret(&self, withhold: bool) {
        self.state.lock().unwrap().withhold_secret = withhold;
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn created(&self) -> Vec<IntentRequest> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn canceled(&self) -> Vec<String> {
        self.state.lock().unwrap().canceled.clone()
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn rejected(status: u16, message: &str) -> OracleError {
    OracleError::Rejected {
        status,
        message: message.to_string(),
    }
}

#[async_trait::async_trait]
impl PaymentOracle for ScriptedOracle {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, OracleError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_create {
            return Err(rejected(402, "card_declined"));
        }
        state.issued += 1;
        let id = match state.queued_ids.pop_front() {
            Some(id) => id,
            None => format!("pi_test_{}", state.issued),
        };
        state
            .intents
            .insert(id.clone(), IntentStatus::RequiresPaymentMethod);
        state.created.push(request);
        Ok(PaymentIntent {
            client_secret: (!state.withhold_secret).then(|| format!("{id}_secret")),
            id,
            status: IntentStatus::RequiresPaymentMethod,
        })
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
        self.pause().await;
        let state = self.state.lock().unwrap();
        if state.fail_retrieve {
            return Err(rejected(500, "api_error"));
        }
        let status = state
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| rejected(404, "resource_missing"))?;
        Ok(PaymentIntent {
            id: intent_id.to_string(),
            client_secret: Some(format!("{intent_id}_secret")),
            status,
        })
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        if state.fail_cancel {
            return Err(rejected(500, "api_error"));
        }
        match state.intents.get(intent_id) {
            None => return Err(rejected(404, "resource_missing")),
            Some(IntentStatus::Succeeded | IntentStatus::Canceled) => {
                return Err(rejected(400, "payment_intent_unexpected_state"));
            }
            Some(_) => {}
        }
        state
            .intents
            .insert(intent_id.to_string(), IntentStatus::Canceled);
        state.canceled.push(intent_id.to_string());
        Ok(PaymentIntent {
            id: intent_id.to_string(),
            client_secret: None,
            status: IntentStatus::Canceled,
        })
    }
}

/// The core subsystem wired over the in-memory store and scripted oracle.
pub(crate) struct Harness {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub lifecycle: OrderLifecycle,
    pub oracle: Arc<ScriptedOracle>,
    pub reconciler: PaymentReconciler,
    pub payment_config: Arc<RwLock<PaymentConfig>>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::with_services(catalog()));
        let registry = Arc::new(ConnectionRegistry::new());
        let broker = NotificationBroker::new(registry.clone());
        let lifecycle = OrderLifecycle::new(store.clone(), store.clone(), broker);
        let oracle = Arc::new(ScriptedOracle::default());
        let payment_config = Arc::new(RwLock::new(PaymentConfig {
            secret_key: "sk_test".to_string(),
            api_base: "http://localhost/v1/".parse().unwrap(),
            currency: "usd".to_string(),
            timeout: Duration::from_secs(2),
        }));
        let reconciler =
            PaymentReconciler::new(oracle.clone(), lifecycle.clone(), payment_config.clone());
        Self {
            store,
            registry,
            lifecycle,
            oracle,
            reconciler,
            payment_config,
        }
    }

    /// Register a listener and discard its connection acknowledgement.
    pub fn listen(&self, audience: AudienceRole, identity: i64) -> EnvelopeReceiver {
        let (tx, mut rx) = connection_channel();
        self.registry.register_audience(audience, Some(identity), tx);
        rx.try_recv().unwrap();
        rx
    }

    pub async fn create_order(&self, client_id: i64, service_id: i64) -> OrderRecord {
        self.lifecycle
            .process(CreateOrder {
                actor: client(client_id),
                service_id,
            })
            .await
            .unwrap()
    }
}
