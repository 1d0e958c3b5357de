//! Bearer token format shared by the server and its clients.
//!
//! A token names a principal and is authenticated with HMAC-SHA256:
//!
//! ```text
//! {identity}.{role}.{issued_at}.{base64url_signature}
//! ```
//!
//! The signature covers `"{identity}.{role}.{issued_at}"`. The encoding is
//! URL-safe so a token can travel in a WebSocket path segment. Issuing
//! tokens belongs to the credential service; [`issue_token`] exists for that
//! service and for tests.

use crate::objects::roles::UserRole;

/// Header name carrying the token on HTTP requests.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Scheme prefix of the authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Default maximum token age (in seconds).
pub const DEFAULT_MAX_TOKEN_AGE: i64 = 30 * 60;

/// How far in the future `issued_at` may lie before a token is refused.
pub const MAX_CLOCK_SKEW: i64 = 60;

/// An authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    pub identity: i64,
    pub role: UserRole,
}

impl Principal {
    pub fn new(identity: i64, role: UserRole) -> Self {
        Self { identity, role }
    }
}

/// Errors produced by token operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token format")]
    InvalidFormat,
    #[error("invalid base64 encoding")]
    InvalidBase64,
    #[error("unknown role in token")]
    UnknownRole,
    #[error("invalid signature")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
    #[error("token issued in the future")]
    IssuedInFuture,
}

impl From<ring::error::Unspecified> for TokenError {
    fn from(_: ring::error::Unspecified) -> Self {
        Self::SignatureMismatch
    }
}

fn signing_input(principal: &Principal, issued_at: i64) -> String {
    format!(
        "{}.{}.{}",
        principal.identity,
        principal.role.as_str(),
        issued_at
    )
}

/// Issue a token for `principal` stamped with the current time.
pub fn issue_token(principal: Principal, key: &[u8]) -> String {
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    issue_token_at(principal, now, key)
}

/// Issue a token for `principal` with an explicit `issued_at` timestamp.
pub fn issue_token_at(principal: Principal, issued_at: i64, key: &[u8]) -> String {
    let data = signing_input(&principal, issued_at);
    let sig = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
    );
    format!(
        "{}.{}",
        data,
        fast32::base64::RFC4648_URL_NOPAD.encode(sig.as_ref())
    )
}

/// Verify a token and return the principal it names.
///
/// Checks the HMAC, that the token is no older than `max_age` seconds, and
/// that it was not issued more than [`MAX_CLOCK_SKEW`] seconds ahead of now.
pub fn verify_token(token: &str, key: &[u8], max_age: i64) -> Result<Principal, TokenError> {
    let mut parts = token.splitn(4, '.');
    let (Some(identity), Some(role), Some(issued_at), Some(signature)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::InvalidFormat);
    };

    let identity: i64 = identity.parse().map_err(|_| TokenError::InvalidFormat)?;
    let issued_at: i64 = issued_at.parse().map_err(|_| TokenError::InvalidFormat)?;
    let role: UserRole = role.parse().map_err(|_| TokenError::UnknownRole)?;
    let signature = fast32::base64::RFC4648_URL_NOPAD
        .decode_str(signature)
        .map_err(|_| TokenError::InvalidBase64)?;

    let principal = Principal { identity, role };
    let data = signing_input(&principal, issued_at);
    ring::hmac::verify(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, key),
        data.as_bytes(),
        &signature,
    )?;

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    // None only for ages that overflow, which are far past any max_age.
    match now.checked_sub(issued_at) {
        Some(age) if age < -MAX_CLOCK_SKEW => Err(TokenError::IssuedInFuture),
        Some(age) if age <= max_age => Ok(principal),
        _ => Err(TokenError::Expired),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn strip_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
