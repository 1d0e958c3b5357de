use crate::framework::DatabaseProcessor;
use crate::store::{OrderFilter, Page};
use gigmart_sdk::objects::OrderStatus as SdkOrderStatus;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub client_id: i64,
    pub worker_id: Option<i64>,
    pub service_id: i64,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub payment_reference: Option<String>,
    /// Bumped by the store on every successful update; compared on write.
    pub version: i64,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Order status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `gigmart_sdk::objects::OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "order_status")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
    Completed,
}

impl OrderStatus {
    /// `Canceled` and `Completed` accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        SdkOrderStatus::from(*self).fmt(f)
    }
}

impl From<OrderStatus> for SdkOrderStatus {
    fn from(value: OrderStatus) -> Self {
        match value {
            OrderStatus::Pending => SdkOrderStatus::Pending,
            OrderStatus::Paid => SdkOrderStatus::Paid,
            OrderStatus::Canceled => SdkOrderStatus::Canceled,
            OrderStatus::Completed => SdkOrderStatus::Completed,
        }
    }
}

/// Data for inserting a new order. Orders always start `Pending` and unassigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub client_id: i64,
    pub service_id: i64,
    pub amount: Decimal,
}

impl NewOrder {
    /// Materialize the record a store persists for this insert.
    pub fn into_record(self, order_id: Uuid, now: time::PrimitiveDateTime) -> OrderRecord {
        OrderRecord {
            order_id,
            client_id: self.client_id,
            worker_id: None,
            service_id: self.service_id,
            status: OrderStatus::Pending,
            amount: self.amount,
            payment_reference: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

const ORDER_COLUMNS: &str = r#"
    order_id,
    client_id,
    worker_id,
    service_id,
    status,
    amount,
    payment_reference,
    version,
    created_at,
    updated_at
"#;

#[derive(Debug, Clone)]
pub struct GetOrderRecordById {
    pub order_id: Uuid,
}

impl Processor<GetOrderRecordById> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderRecordById")]
    async fn process(&self, query: GetOrderRecordById) -> Result<Option<OrderRecord>, sqlx::Error> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM order_records WHERE order_id = $1");
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct GetOrderRecordByPaymentReference {
    pub payment_reference: String,
}

impl Processor<GetOrderRecordByPaymentReference> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderRecordByPaymentReference")]
    async fn process(
        &self,
        query: GetOrderRecordByPaymentReference,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM order_records WHERE payment_reference = $1");
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(query.payment_reference)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderRecord {
    pub order: NewOrder,
}

impl Processor<CreateOrderRecord> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateOrderRecord")]
    async fn process(&self, insert: CreateOrderRecord) -> Result<OrderRecord, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO order_records (order_id, client_id, service_id, status, amount, version)
            VALUES ($1, $2, $3, 'pending', $4, 0)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(Uuid::now_v7())
            .bind(insert.order.client_id)
            .bind(insert.order.service_id)
            .bind(insert.order.amount)
            .fetch_one(&self.pool)
            .await
    }
}

/// Write the mutable fields of `record` if its stored version still equals
/// `record.version`. Returns `None` when the version moved (or the row is gone).
#[derive(Debug, Clone)]
pub struct UpdateOrderRecordVersioned {
    pub record: OrderRecord,
}

impl Processor<UpdateOrderRecordVersioned> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateOrderRecordVersioned")]
    async fn process(
        &self,
        update: UpdateOrderRecordVersioned,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let record = update.record;
        let sql = format!(
            r#"
            UPDATE order_records
            SET worker_id = $3,
                status = $4,
                payment_reference = $5,
                updated_at = $6,
                version = version + 1
            WHERE order_id = $1 AND version = $2
            RETURNING {ORDER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(record.order_id)
            .bind(record.version)
            .bind(record.worker_id)
            .bind(record.status)
            .bind(record.payment_reference)
            .bind(record.updated_at)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct ListOrderRecords {
    pub filter: OrderFilter,
    pub page: Page,
}

impl Processor<ListOrderRecords> for DatabaseProcessor {
    type Output = Vec<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrderRecords")]
    async fn process(&self, query: ListOrderRecords) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let (predicate, identity) = match query.filter {
            OrderFilter::All => ("TRUE", None),
            OrderFilter::Client(id) => ("client_id = $3", Some(id)),
            OrderFilter::Worker(id) => ("worker_id = $3", Some(id)),
        };
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM order_records
            WHERE {predicate}
            ORDER BY created_at DESC, order_id DESC
            OFFSET $1 LIMIT $2
            "#
        );
        let mut q = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(i64::from(query.page.offset))
            .bind(i64::from(query.page.limit));
        if let Some(identity) = identity {
            q = q.bind(identity);
        }
        q.fetch_all(&self.pool).await
    }
}
