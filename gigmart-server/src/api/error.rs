//! Error responses shared by every handler.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gigmart_core::auth::AuthError;
use gigmart_core::error::ErrorKind;
use gigmart_core::lifecycle::OrderError;
use gigmart_core::payment::PaymentError;
use gigmart_core::store::StoreError;
use gigmart_sdk::objects::ApiErrorBody;

/// A failed request: the error kind plus a caller-facing reason.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub reason: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::PreconditionFailed => StatusCode::CONFLICT,
            ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::InvalidAudience => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        if let OrderError::Store(e) = &err {
            tracing::error!(error = %e, "Record store failure");
        }
        Self::new(err.kind(), err.reason())
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err.kind() {
            ErrorKind::Internal => tracing::error!(error = %err, "Payment request failed"),
            ErrorKind::UpstreamFailure => tracing::warn!(error = %err, "Payment provider failure"),
            _ => {}
        }
        Self::new(err.kind(), err.reason())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        OrderError::from(err).into()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(error = %err, "Rejected credential");
        Self::new(err.kind(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiErrorBody {
            error: self.kind.as_str().to_string(),
            reason: self.reason,
        };
        (status, Json(body)).into_response()
    }
}
