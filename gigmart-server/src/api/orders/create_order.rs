use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use gigmart_core::lifecycle::CreateOrder;
use gigmart_sdk::objects::CreateOrderRequest;
use kanau::processor::Processor;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders`: a client orders a catalog service.
///
/// The amount is copied from the service price; every worker listening is
/// told about the new order.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .lifecycle
        .process(CreateOrder {
            actor,
            service_id: request.service_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(&order))))
}
