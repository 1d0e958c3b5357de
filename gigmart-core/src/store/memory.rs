use super::{OrderFilter, OrderStore, Page, ServiceCatalog, StoreError};
use crate::entities::order_records::{NewOrder, OrderRecord};
use crate::entities::service_listings::ServiceListing;
use crate::utils::clock::now_utc_primitive;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process order store and service catalog.
///
/// Used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<Uuid, OrderRecord>>,
    services: RwLock<BTreeMap<i64, ServiceListing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: impl IntoIterator<Item = ServiceListing>) -> Self {
        Self {
            orders: RwLock::default(),
            services: RwLock::new(services.into_iter().map(|s| (s.id, s)).collect()),
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for MemoryStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let record = order.into_record(Uuid::now_v7(), now_utc_primitive());
        self.orders
            .write()
            .await
            .insert(record.order_id, record.clone());
        Ok(record)
    }

    async fn update(&self, order: OrderRecord) -> Result<Option<OrderRecord>, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(stored) = orders.get_mut(&order.order_id) else {
            return Ok(None);
        };
        if stored.version != order.version {
            return Ok(None);
        }
        // Identity, ownership and price are fixed at creation.
        stored.worker_id = order.worker_id;
        stored.status = order.status;
        stored.payment_reference = order.payment_reference;
        stored.updated_at = order.updated_at;
        stored.version += 1;
        Ok(Some(stored.clone()))
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| o.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn list(&self, filter: OrderFilter, page: Page) -> Result<Vec<OrderRecord>, StoreError> {
        let orders = self.orders.read().await;
        let mut matched: Vec<&OrderRecord> = orders.values().filter(|o| filter.matches(o)).collect();
        matched.sort_by(|a, b| {
            (b.created_at, b.order_id).cmp(&(a.created_at, a.order_id))
        });
        Ok(matched
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl ServiceCatalog for MemoryStore {
    async fn get_service(&self, id: i64) -> Result<Option<ServiceListing>, StoreError> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn list_services(
        &self,
        category: Option<&str>,
        page: Page,
    ) -> Result<Vec<ServiceListing>, StoreError> {
        Ok(self
            .services
            .read()
            .await
            .values()
            .filter(|s| s.is_active)
            .filter(|s| category.is_none_or(|c| s.category == c))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}
