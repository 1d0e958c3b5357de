//! Catalog endpoints. Public; no token required.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use gigmart_core::entities::service_listings::ServiceListing;
use gigmart_core::error::ErrorKind;
use gigmart_core::store::Page;
use gigmart_sdk::objects::{ServiceQuery, ServiceResponse};

use super::error::ApiError;
use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services))
        .route("/services/{id}", get(get_service))
}

fn to_response(listing: ServiceListing) -> ServiceResponse {
    ServiceResponse {
        id: listing.id,
        name: listing.name,
        description: listing.description,
        price: listing.price,
        category: listing.category,
        is_active: listing.is_active,
    }
}

/// `GET /services`: active listings, optionally filtered by category.
async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ServiceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let listings = state
        .lifecycle
        .catalog()
        .list_services(
            query.category.as_deref(),
            Page::new(query.offset, query.limit),
        )
        .await?;
    let response: Vec<_> = listings.into_iter().map(to_response).collect();
    Ok(Json(response))
}

/// `GET /services/{id}`
async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state
        .lifecycle
        .catalog()
        .get_service(id)
        .await?
        .ok_or_else(|| ApiError::new(ErrorKind::NotFound, format!("service {id}")))?;
    Ok(Json(to_response(listing)))
}
