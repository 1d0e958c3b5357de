//! Authentication oracle.
//!
//! Turns a bearer credential into a [`Principal`]. Token issuance lives with
//! the credential service; this side only verifies.

use crate::config::AuthConfig;
use crate::error::ErrorKind;
use gigmart_sdk::token::{TokenError, verify_token};
use std::sync::Arc;
use tokio::sync::RwLock;

pub use gigmart_sdk::token::Principal;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] TokenError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unauthenticated
    }
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credential: &str) -> Result<Principal, AuthError>;
}

/// Verifies HMAC bearer tokens against the reloadable auth config.
#[derive(Clone)]
pub struct TokenAuthenticator {
    config: Arc<RwLock<AuthConfig>>,
}

impl TokenAuthenticator {
    pub fn new(config: Arc<RwLock<AuthConfig>>) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, credential: &str) -> Result<Principal, AuthError> {
        if credential.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        let config = self.config.read().await;
        let principal = verify_token(credential, &config.token_secret, config.token_max_age_secs)?;
        Ok(principal)
    }
}
