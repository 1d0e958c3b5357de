//! Order and payment endpoints. All require a bearer token.

use axum::{
    Router,
    routing::{get, post, put},
};
use gigmart_core::entities::order_records::OrderRecord;
use gigmart_sdk::objects::OrderResponse;

use crate::state::AppState;

mod accept_order;
mod complete_order;
mod create_order;
mod get_order;
mod list_orders;
mod payment;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(create_order::create_order).get(list_orders::list_orders),
        )
        .route("/orders/{order_id}", get(get_order::get_order))
        .route(
            "/orders/{order_id}/accept",
            put(accept_order::accept_order),
        )
        .route(
            "/orders/{order_id}/complete",
            put(complete_order::complete_order),
        )
        .route("/orders/{order_id}/payment", post(payment::create_payment))
        .route(
            "/orders/{order_id}/payment/confirm",
            post(payment::confirm_payment),
        )
        .route(
            "/orders/{order_id}/payment/cancel",
            post(payment::cancel_payment),
        )
}

/// Convert an `OrderRecord` (DB model) into an `OrderResponse` (API model).
fn to_response(record: &OrderRecord) -> OrderResponse {
    OrderResponse {
        order_id: record.order_id,
        client_id: record.client_id,
        worker_id: record.worker_id,
        service_id: record.service_id,
        status: record.status.into(),
        amount: record.amount,
        payment_intent_id: record.payment_reference.clone(),
        created_at: record.created_at.assume_utc().unix_timestamp(),
        updated_at: record.updated_at.assume_utc().unix_timestamp(),
    }
}
