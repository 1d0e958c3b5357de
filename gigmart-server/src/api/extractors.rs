//! Custom Axum extractors for request authentication.

use axum::{extract::FromRequestParts, http::request::Parts};
use gigmart_core::auth::{AuthError, Principal};
use gigmart_sdk::token::{AUTHORIZATION_HEADER, strip_bearer};

use super::error::ApiError;
use crate::state::AppState;

/// The principal named by the request's `Authorization: Bearer` token.
///
/// Implements `FromRequestParts` so it can be combined with `Json<T>`,
/// `Path<T>`, etc.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(strip_bearer)
            .ok_or(AuthError::MissingCredential)?;
        let principal = state.authenticator.authenticate(token).await?;
        Ok(Authenticated(principal))
    }
}
