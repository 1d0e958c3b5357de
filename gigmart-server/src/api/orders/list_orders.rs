use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use gigmart_core::lifecycle::ListVisibleOrders;
use gigmart_core::store::Page;
use gigmart_sdk::objects::PageQuery;
use kanau::processor::Processor;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /orders`: clients see their own orders, workers their assigned
/// ones, admins everything.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .lifecycle
        .process(ListVisibleOrders {
            actor,
            page: Page::new(query.offset, query.limit),
        })
        .await?;
    let response: Vec<_> = records.iter().map(to_response).collect();
    Ok(Json(response))
}
