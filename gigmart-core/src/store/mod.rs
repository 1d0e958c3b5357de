//! Record store abstractions.
//!
//! The core talks to persistence through two traits: [`OrderStore`] for the
//! mutable order records and [`ServiceCatalog`] for the read-mostly service
//! listings. [`MemoryStore`] backs both in-process; [`PgStore`] backs both
//! with PostgreSQL.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::entities::order_records::{NewOrder, OrderRecord};
use crate::entities::service_listings::ServiceListing;
use crate::error::ErrorKind;
use uuid::Uuid;

/// Largest page any list call returns.
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

/// Offset/limit window over an ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Page {
    /// Build a page, clamping `limit` into `1..=MAX_PAGE_LIMIT`.
    pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit.unwrap_or(MAX_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Which orders a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    All,
    /// Orders posted by this client.
    Client(i64),
    /// Orders assigned to this worker.
    Worker(i64),
}

impl OrderFilter {
    pub fn matches(&self, order: &OrderRecord) -> bool {
        match self {
            OrderFilter::All => true,
            OrderFilter::Client(id) => order.client_id == *id,
            OrderFilter::Worker(id) => order.worker_id == Some(*id),
        }
    }
}

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn get(&self, order_id: Uuid) -> Result<Option<OrderRecord>, StoreError>;

    async fn insert(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    /// Persist `order` if the stored version still equals `order.version`.
    ///
    /// On success the stored record (with its version bumped) is returned.
    /// `None` means another writer got there first, or the order is gone;
    /// the caller should re-read and re-evaluate.
    async fn update(&self, order: OrderRecord) -> Result<Option<OrderRecord>, StoreError>;

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<OrderRecord>, StoreError>;

    /// Newest first.
    async fn list(&self, filter: OrderFilter, page: Page) -> Result<Vec<OrderRecord>, StoreError>;
}

#[async_trait::async_trait]
pub trait ServiceCatalog: Send + Sync {
    /// Look up a listing by id, active or not.
    async fn get_service(&self, id: i64) -> Result<Option<ServiceListing>, StoreError>;

    /// Active listings ordered by id.
    async fn list_services(
        &self,
        category: Option<&str>,
        page: Page,
    ) -> Result<Vec<ServiceListing>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps_limit() {
        assert_eq!(Page::new(None, None), Page { offset: 0, limit: 100 });
        assert_eq!(Page::new(Some(5), Some(0)).limit, 1);
        assert_eq!(Page::new(None, Some(1000)).limit, MAX_PAGE_LIMIT);
        assert_eq!(Page::new(Some(20), Some(10)), Page { offset: 20, limit: 10 });
    }
}
