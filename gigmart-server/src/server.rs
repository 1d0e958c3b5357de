//! Axum server setup and router configuration.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .nest("/api/v1", api::v1_router())
        .nest("/ws", api::ws_router())
        // Add state to all routes
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use gigmart_core::config::{AuthConfig, PaymentConfig, ServerConfig, SharedConfig};
    use gigmart_core::entities::service_listings::ServiceListing;
    use gigmart_core::payment::{
        IntentRequest, IntentStatus, OracleError, PaymentIntent, PaymentOracle,
    };
    use gigmart_core::store::MemoryStore;
    use gigmart_sdk::client::{ClientError, EventListener, MarketClient};
    use gigmart_sdk::objects::{
        AudienceRole, OrderStatus, ServerEnvelope, ServiceQuery, UserRole, WsCloseCode,
    };
    use gigmart_sdk::token::{Principal, issue_token};
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tower::ServiceExt; // oneshot
    use url::Url;

    const SECRET: &[u8] = b"router-test-secret";

    /// Oracle that always settles: created intents report success on retrieve.
    #[derive(Default)]
    struct SettlingOracle {
        unavailable: AtomicBool,
    }

    #[async_trait::async_trait]
    impl PaymentOracle for SettlingOracle {
        async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, OracleError> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(OracleError::Rejected {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            let id = format!("pi_{}", request.order_id.simple());
            Ok(PaymentIntent {
                client_secret: Some(format!("{id}_secret")),
                id,
                status: IntentStatus::RequiresPaymentMethod,
            })
        }

        async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
            Ok(PaymentIntent {
                id: intent_id.to_string(),
                client_secret: None,
                status: IntentStatus::Succeeded,
            })
        }

        async fn cancel_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
            Ok(PaymentIntent {
                id: intent_id.to_string(),
                client_secret: None,
                status: IntentStatus::Canceled,
            })
        }
    }

    struct TestApp {
        router: Router,
        oracle: Arc<SettlingOracle>,
    }

    fn make_app() -> TestApp {
        let config = SharedConfig::new(
            ServerConfig {
                listen: "127.0.0.1:0".parse().unwrap(),
            },
            AuthConfig::new(SECRET.to_vec(), 1800),
            PaymentConfig {
                secret_key: "sk_test".to_string(),
                api_base: "http://localhost/v1/".parse().unwrap(),
                currency: "usd".to_string(),
                timeout: Duration::from_secs(2),
            },
        );
        let store = Arc::new(MemoryStore::with_services([
            ServiceListing {
                id: 1,
                name: "Web Development".to_string(),
                description: String::new(),
                price: Decimal::new(50000, 2),
                category: "Technology".to_string(),
                is_active: true,
            },
            ServiceListing {
                id: 2,
                name: "Logo Design".to_string(),
                description: String::new(),
                price: Decimal::new(20000, 2),
                category: "Design".to_string(),
                is_active: false,
            },
        ]));
        let oracle = Arc::new(SettlingOracle::default());
        let state = AppState::new(config, store.clone(), store, oracle.clone());
        TestApp {
            router: build_router(state),
            oracle,
        }
    }

    fn token(identity: i64, role: UserRole) -> String {
        issue_token(Principal::new(identity, role), SECRET)
    }

    async fn call(
        app: &TestApp,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn create_order(app: &TestApp, client: &str) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/orders",
            Some(client),
            Some(serde_json::json!({ "service_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["order_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = make_app();
        let (status, body) = call(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_services_list_active_only() {
        let app = make_app();
        let (status, body) = call(&app, "GET", "/api/v1/services", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "Web Development");
        assert_eq!(listed[0]["price"], "500.00");

        let (status, body) = call(&app, "GET", "/api/v1/services/99", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_orders_require_token() {
        let app = make_app();
        let (status, body) = call(&app, "GET", "/api/v1/orders", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");

        let forged = issue_token(Principal::new(1, UserRole::Admin), b"wrong");
        let (status, _) = call(&app, "GET", "/api/v1/orders", Some(&forged), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let app = make_app();
        let client = token(1, UserRole::Client);
        let worker = token(20, UserRole::Worker);
        let rival = token(21, UserRole::Worker);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/orders",
            Some(&worker),
            Some(serde_json::json!({ "service_id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "not_client");

        let order_id = create_order(&app, &client).await;
        let accept = format!("/api/v1/orders/{order_id}/accept");
        let (status, body) = call(&app, "PUT", &accept, Some(&worker), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["worker_id"], 20);
        assert_eq!(body["status"], "pending");

        let (status, body) = call(&app, "PUT", &accept, Some(&rival), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "precondition_failed");
        assert_eq!(body["reason"], "already_assigned");

        let complete = format!("/api/v1/orders/{order_id}/complete");
        let (status, body) = call(&app, "PUT", &complete, Some(&worker), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "not_paid");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/orders/{order_id}/payment"),
            Some(&client),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let intent_id = body["payment_intent_id"].as_str().unwrap().to_string();
        assert!(body["client_secret"].as_str().unwrap().starts_with(&intent_id));

        let intent = serde_json::json!({ "payment_intent_id": intent_id });
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/orders/{order_id}/payment/confirm"),
            Some(&client),
            Some(intent.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "paid");

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/orders/{order_id}/payment/cancel"),
            Some(&client),
            Some(intent),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["reason"], "already_paid");

        let (status, body) = call(&app, "PUT", &complete, Some(&worker), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/v1/orders/{order_id}"),
            Some(&rival),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_to_principal() {
        let app = make_app();
        let alice = token(1, UserRole::Client);
        let bob = token(2, UserRole::Client);
        create_order(&app, &alice).await;
        create_order(&app, &alice).await;
        create_order(&app, &bob).await;

        let (_, body) = call(&app, "GET", "/api/v1/orders", Some(&alice), None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        let (_, body) = call(&app, "GET", "/api/v1/orders?limit=1", Some(&alice), None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        let admin = token(99, UserRole::Admin);
        let (_, body) = call(&app, "GET", "/api/v1/orders", Some(&admin), None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_bad_gateway() {
        let app = make_app();
        let client = token(1, UserRole::Client);
        let order_id = create_order(&app, &client).await;
        app.oracle.unavailable.store(true, Ordering::SeqCst);

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/orders/{order_id}/payment"),
            Some(&client),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "upstream_failure");
    }

    /// Serve the app on an ephemeral port and return its address.
    async fn serve(app: &TestApp) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app.router.clone();
        tokio::spawn(async move { axum::serve(listener, router).await });
        addr
    }

    fn ws_base(addr: SocketAddr) -> Url {
        format!("ws://{addr}/").parse().unwrap()
    }

    fn http_base(addr: SocketAddr) -> Url {
        format!("http://{addr}/").parse().unwrap()
    }

    #[tokio::test]
    async fn test_listener_receives_ack_and_new_orders() {
        let app = make_app();
        let addr = serve(&app).await;

        let mut listener = EventListener::connect(&ws_base(addr), &token(20, UserRole::Worker))
            .await
            .unwrap();
        match listener.next_envelope().await.unwrap().unwrap() {
            ServerEnvelope::Connection(ack) => assert_eq!(ack.audience, AudienceRole::Workers),
            other => panic!("expected connection ack, got {other:?}"),
        }

        let order_id = create_order(&app, &token(1, UserRole::Client)).await;
        match listener.next_envelope().await.unwrap().unwrap() {
            ServerEnvelope::NewOrder(notice) => {
                assert_eq!(notice.order_id.to_string(), order_id);
                assert_eq!(notice.amount, Decimal::new(50000, 2));
                assert_eq!(notice.service_name, "Web Development");
            }
            other => panic!("expected new order, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listener_audience_mismatch_closes_4003() {
        let app = make_app();
        let addr = serve(&app).await;

        let mut listener = EventListener::connect_audience(
            &ws_base(addr),
            AudienceRole::Workers,
            &token(1, UserRole::Client),
        )
        .await
        .unwrap();
        match listener.next_envelope().await {
            Some(Err(ClientError::Closed { code, .. })) => {
                assert_eq!(code, WsCloseCode::AUDIENCE_MISMATCH)
            }
            other => panic!("expected close 4003, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listener_bad_token_closes_4001() {
        let app = make_app();
        let addr = serve(&app).await;

        let mut listener = EventListener::connect(&ws_base(addr), "1.client.0.AAAA")
            .await
            .unwrap();
        match listener.next_envelope().await {
            Some(Err(ClientError::Closed { code, .. })) => {
                assert_eq!(code, WsCloseCode::AUTHENTICATION_FAILED)
            }
            other => panic!("expected close 4001, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_market_client_create_and_accept() {
        let app = make_app();
        let addr = serve(&app).await;
        let client = MarketClient::new(http_base(addr), token(1, UserRole::Client));
        let worker = MarketClient::new(http_base(addr), token(20, UserRole::Worker));
        let rival = MarketClient::new(http_base(addr), token(21, UserRole::Worker));

        let mut owner = EventListener::connect(&ws_base(addr), &token(1, UserRole::Client))
            .await
            .unwrap();
        owner.next_envelope().await.unwrap().unwrap();

        let services = client.list_services(&ServiceQuery::default()).await.unwrap();
        assert_eq!(services.len(), 1);

        let order = client.create_order(services[0].id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.worker_id, None);
        assert_eq!(order.amount, Decimal::new(50000, 2));

        let accepted = worker.accept_order(order.order_id).await.unwrap();
        assert_eq!(accepted.worker_id, Some(20));
        match owner.next_envelope().await.unwrap().unwrap() {
            ServerEnvelope::OrderAccepted(notice) => {
                assert_eq!(notice.order_id, order.order_id);
                assert_eq!(notice.worker_id, 20);
            }
            other => panic!("expected order accepted, got {other:?}"),
        }

        let err = rival.accept_order(order.order_id).await.unwrap_err();
        let body = err.api_error().unwrap();
        assert_eq!(body.error, "precondition_failed");
        assert_eq!(body.reason, "already_assigned");

        let fetched = client.get_order(order.order_id).await.unwrap();
        assert_eq!(fetched, accepted);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let app = make_app();
        let worker = token(5, UserRole::Worker);
        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/v1/orders/{}/accept", uuid::Uuid::now_v7()),
            Some(&worker),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
