use super::{OrderFilter, OrderStore, Page, ServiceCatalog, StoreError};
use crate::entities::order_records::{
    CreateOrderRecord, GetOrderRecordById, GetOrderRecordByPaymentReference, ListOrderRecords,
    NewOrder, OrderRecord, UpdateOrderRecordVersioned,
};
use crate::entities::service_listings::{
    GetServiceListingById, ListActiveServiceListings, ServiceListing,
};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use uuid::Uuid;

/// PostgreSQL-backed order store and service catalog.
#[derive(Clone)]
pub struct PgStore {
    db: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            db: DatabaseProcessor { pool },
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for PgStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.db.process(GetOrderRecordById { order_id }).await?)
    }

    async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        Ok(self.db.process(CreateOrderRecord { order }).await?)
    }

    async fn update(&self, record: OrderRecord) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self.db.process(UpdateOrderRecordVersioned { record }).await?)
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError> {
        Ok(self
            .db
            .process(GetOrderRecordByPaymentReference {
                payment_reference: reference.to_string(),
            })
            .await?)
    }

    async fn list(&self, filter: OrderFilter, page: Page) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(self.db.process(ListOrderRecords { filter, page }).await?)
    }
}

#[async_trait::async_trait]
impl ServiceCatalog for PgStore {
    async fn get_service(&self, id: i64) -> Result<Option<ServiceListing>, StoreError> {
        Ok(self.db.process(GetServiceListingById { id }).await?)
    }

    async fn list_services(
        &self,
        category: Option<&str>,
        page: Page,
    ) -> Result<Vec<ServiceListing>, StoreError> {
        Ok(self
            .db
            .process(ListActiveServiceListings {
                category: category.map(str::to_string),
                page,
            })
            .await?)
    }
}
