use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use gigmart_core::lifecycle::CompleteOrder;
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `PUT /orders/{order_id}/complete`: the assigned worker delivers a paid order.
pub(super) async fn complete_order(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle
        .process(CompleteOrder { actor, order_id })
        .await?;
    Ok(Json(to_response(&order)))
}
