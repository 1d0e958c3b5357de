use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use gigmart_core::lifecycle::GetVisibleOrder;
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `GET /orders/{order_id}`
pub(super) async fn get_order(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle
        .process(GetVisibleOrder { actor, order_id })
        .await?;
    Ok(Json(to_response(&order)))
}
