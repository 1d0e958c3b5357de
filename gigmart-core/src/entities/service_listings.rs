use crate::framework::DatabaseProcessor;
use crate::store::Page;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// A purchasable service in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ServiceListing {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct GetServiceListingById {
    pub id: i64,
}

impl Processor<GetServiceListingById> for DatabaseProcessor {
    type Output = Option<ServiceListing>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetServiceListingById")]
    async fn process(
        &self,
        query: GetServiceListingById,
    ) -> Result<Option<ServiceListing>, sqlx::Error> {
        sqlx::query_as::<_, ServiceListing>(
            r#"
            SELECT id, name, description, price, category, is_active
            FROM service_listings
            WHERE id = $1
            "#,
        )
        .bind(query.id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// Active listings, optionally narrowed to one category.
#[derive(Debug, Clone)]
pub struct ListActiveServiceListings {
    pub category: Option<String>,
    pub page: Page,
}

impl Processor<ListActiveServiceListings> for DatabaseProcessor {
    type Output = Vec<ServiceListing>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListActiveServiceListings")]
    async fn process(
        &self,
        query: ListActiveServiceListings,
    ) -> Result<Vec<ServiceListing>, sqlx::Error> {
        sqlx::query_as::<_, ServiceListing>(
            r#"
            SELECT id, name, description, price, category, is_active
            FROM service_listings
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(query.category)
        .bind(i64::from(query.page.offset))
        .bind(i64::from(query.page.limit))
        .fetch_all(&self.pool)
        .await
    }
}
