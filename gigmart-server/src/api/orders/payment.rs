//! Payment attempt endpoints.
//!
//! The client first begins an attempt and completes it with the provider's
//! frontend SDK using the returned `client_secret`, then confirms (or
//! cancels) the attempt here by its `payment_intent_id`.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use gigmart_core::payment::{BeginPayment, CancelPayment, ConfirmPayment};
use gigmart_sdk::objects::{PaymentIntentRequest, PaymentSessionResponse};
use kanau::processor::Processor;
use uuid::Uuid;

use super::to_response;
use crate::api::error::ApiError;
use crate::api::extractors::Authenticated;
use crate::state::AppState;

/// `POST /orders/{order_id}/payment`
pub(super) async fn create_payment(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .reconciler
        .process(BeginPayment { actor, order_id })
        .await?;
    Ok(Json(PaymentSessionResponse {
        order_id: session.order.order_id,
        payment_intent_id: session.intent_id,
        client_secret: session.client_secret,
    }))
}

/// `POST /orders/{order_id}/payment/confirm`
pub(super) async fn confirm_payment(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .reconciler
        .process(ConfirmPayment {
            actor,
            intent_id: request.payment_intent_id,
            order_id: Some(order_id),
        })
        .await?;
    Ok(Json(to_response(&order)))
}

/// `POST /orders/{order_id}/payment/cancel`
///
/// Rejected with `409 already_paid` once the order has been paid.
pub(super) async fn cancel_payment(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(order_id): Path<Uuid>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state
        .reconciler
        .process(CancelPayment {
            actor,
            intent_id: request.payment_intent_id,
            order_id: Some(order_id),
        })
        .await?;
    Ok(Json(to_response(&order)))
}
