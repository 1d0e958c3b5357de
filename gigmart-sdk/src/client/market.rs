//! Action API client (client / worker / admin frontends → gigmart server).
//!
//! Every request carries `Authorization: Bearer <token>`.

use reqwest::{Client, Method, RequestBuilder};
use url::Url;
use uuid::Uuid;

use super::{ClientError, parse_response};
use crate::objects::{
    CreateOrderRequest, OrderResponse, PageQuery, PaymentIntentRequest, PaymentSessionResponse,
    ServiceQuery, ServiceResponse,
};
use crate::token::{AUTHORIZATION_HEADER, BEARER_PREFIX};

/// Typed HTTP client for the gigmart **action API**.
#[derive(Debug, Clone)]
pub struct MarketClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl MarketClient {
    /// Create a new `MarketClient`.
    ///
    /// * `base_url` – root URL of the gigmart server.
    /// * `token` – bearer token issued by the credential service.
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self.base_url.join(path)?;
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{}", self.token)))
    }

    /// `GET /api/v1/services` – browse active service listings.
    pub async fn list_services(
        &self,
        query: &ServiceQuery,
    ) -> Result<Vec<ServiceResponse>, ClientError> {
        let resp = self
            .request(Method::GET, "/api/v1/services")?
            .query(query)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/orders` – order a service (clients only).
    pub async fn create_order(&self, service_id: i64) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(Method::POST, "/api/v1/orders")?
            .json(&CreateOrderRequest { service_id })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/orders` – list the orders visible to the caller.
    pub async fn list_orders(&self, page: PageQuery) -> Result<Vec<OrderResponse>, ClientError> {
        let resp = self
            .request(Method::GET, "/api/v1/orders")?
            .query(&page)
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/orders/{order_id}`.
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(Method::GET, &format!("/api/v1/orders/{order_id}"))?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/orders/{order_id}/accept` – take the order (workers only).
    pub async fn accept_order(&self, order_id: Uuid) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(Method::PUT, &format!("/api/v1/orders/{order_id}/accept"))?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `PUT /api/v1/orders/{order_id}/complete` – finish a paid order.
    pub async fn complete_order(&self, order_id: Uuid) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(Method::PUT, &format!("/api/v1/orders/{order_id}/complete"))?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/orders/{order_id}/payment` – begin a payment attempt.
    pub async fn create_payment(
        &self,
        order_id: Uuid,
    ) -> Result<PaymentSessionResponse, ClientError> {
        let resp = self
            .request(Method::POST, &format!("/api/v1/orders/{order_id}/payment"))?
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/orders/{order_id}/payment/confirm`.
    pub async fn confirm_payment(
        &self,
        order_id: Uuid,
        payment_intent_id: impl Into<String>,
    ) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(
                Method::POST,
                &format!("/api/v1/orders/{order_id}/payment/confirm"),
            )?
            .json(&PaymentIntentRequest {
                payment_intent_id: payment_intent_id.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }

    /// `POST /api/v1/orders/{order_id}/payment/cancel`.
    pub async fn cancel_payment(
        &self,
        order_id: Uuid,
        payment_intent_id: impl Into<String>,
    ) -> Result<OrderResponse, ClientError> {
        let resp = self
            .request(
                Method::POST,
                &format!("/api/v1/orders/{order_id}/payment/cancel"),
            )?
            .json(&PaymentIntentRequest {
                payment_intent_id: payment_intent_id.into(),
            })
            .send()
            .await?;
        parse_response(resp).await
    }
}
