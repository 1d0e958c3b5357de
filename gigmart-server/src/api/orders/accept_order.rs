use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use gigmart_core::lifecycle::AcceptOrder;
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `PUT /orders/{order_id}/accept`: a worker takes an unassigned order.
///
/// Of several concurrent accepts exactly one wins; the others get
/// `409 already_assigned`.
pub(super) async fn accept_order(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle
        .process(AcceptOrder { actor, order_id })
        .await?;
    Ok(Json(to_response(&order)))
}
