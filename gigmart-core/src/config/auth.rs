//! Token verification configuration.

/// Secret and lifetime used to verify bearer tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key shared with the token issuer.
    pub token_secret: Box<[u8]>,
    /// Tokens older than this many seconds are rejected.
    pub token_max_age_secs: i64,
}

impl AuthConfig {
    pub fn new(token_secret: impl Into<Box<[u8]>>, token_max_age_secs: i64) -> Self {
        Self {
            token_secret: token_secret.into(),
            token_max_age_secs,
        }
    }
}
