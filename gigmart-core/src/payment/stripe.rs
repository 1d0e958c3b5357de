//! Payment oracle backed by the Stripe PaymentIntents API.

use super::{IntentRequest, OracleError, PaymentIntent, PaymentOracle};
use crate::config::PaymentConfig;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// Talks to `{api_base}/payment_intents` with the configured secret key.
///
/// Settings are read per call, so a config reload takes effect on the next
/// request.
#[derive(Clone)]
pub struct StripeOracle {
    http_client: reqwest::Client,
    config: Arc<RwLock<PaymentConfig>>,
}

impl StripeOracle {
    pub fn new(config: Arc<RwLock<PaymentConfig>>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    async fn intent_url(&self, suffix: &str) -> Result<(reqwest::Url, PaymentConfig), OracleError> {
        let config = self.config.read().await.clone();
        let url = config
            .api_base
            .join(&format!("payment_intents{suffix}"))
            .map_err(|e| OracleError::Decode(format!("invalid api base: {e}")))?;
        Ok((url, config))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<PaymentIntent, OracleError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message.or(b.error.kind))
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), %message, "Payment provider rejected request");
            return Err(OracleError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_str(&body).map_err(|e| OracleError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl PaymentOracle for StripeOracle {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, OracleError> {
        let (url, config) = self.intent_url("").await?;
        let amount = request.amount_minor.to_string();
        let order_id = request.order_id.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", request.currency.as_str()),
            ("metadata[order_id]", order_id.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        let builder = self
            .http_client
            .post(url)
            .bearer_auth(&config.secret_key)
            .timeout(config.timeout)
            .form(&form);
        self.send(builder).await
    }

    async fn retrieve_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
        let (url, config) = self
            .intent_url(&format!("/{}", urlencoding::encode(intent_id)))
            .await?;
        let builder = self
            .http_client
            .get(url)
            .bearer_auth(&config.secret_key)
            .timeout(config.timeout);
        self.send(builder).await
    }

    async fn cancel_intent(&self, intent_id: &str) -> Result<PaymentIntent, OracleError> {
        let (url, config) = self
            .intent_url(&format!("/{}/cancel", urlencoding::encode(intent_id)))
            .await?;
        let builder = self
            .http_client
            .post(url)
            .bearer_auth(&config.secret_key)
            .timeout(config.timeout);
        self.send(builder).await
    }
}
