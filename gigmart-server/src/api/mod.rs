//! HTTP and WebSocket handlers.
//!
//! # Endpoints
//!
//! - `GET  /api/v1/services`                         – list active services
//! - `GET  /api/v1/services/{id}`                    – show one service
//! - `POST /api/v1/orders`                           – create an order (client)
//! - `GET  /api/v1/orders`                           – list visible orders
//! - `GET  /api/v1/orders/{order_id}`                – show one order
//! - `PUT  /api/v1/orders/{order_id}/accept`         – take an order (worker)
//! - `PUT  /api/v1/orders/{order_id}/complete`       – deliver an order (assigned worker)
//! - `POST /api/v1/orders/{order_id}/payment`        – begin a payment attempt (client)
//! - `POST /api/v1/orders/{order_id}/payment/confirm` – settle a payment (client)
//! - `POST /api/v1/orders/{order_id}/payment/cancel`  – cancel a payment (client)
//! - `GET  /ws/auth/{token}`                         – listen under the token's audience
//! - `GET  /ws/audience/{audience}/{token}`          – listen under an explicit audience

use axum::Router;

use crate::state::AppState;

pub mod error;
pub mod extractors;
mod orders;
mod services;
mod ws;

/// Build the versioned REST router.
pub fn v1_router() -> Router<AppState> {
    Router::new()
        .merge(services::router())
        .merge(orders::router())
}

/// Build the listener router.
pub fn ws_router() -> Router<AppState> {
    ws::router()
}
