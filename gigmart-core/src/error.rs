//! Error taxonomy shared by every core operation.

/// The caller-facing category of a failed operation.
///
/// Each layer keeps its own `thiserror` enum; this is the coarse
/// classification those enums report through their `kind()` method so the
/// action layer can answer consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced order, service or payment reference does not exist.
    NotFound,
    /// The actor lacks permission for the target action.
    Forbidden,
    /// A state-machine guard rejected the transition.
    PreconditionFailed,
    /// The payment oracle failed or timed out.
    UpstreamFailure,
    /// A listener asked for an audience that does not exist.
    InvalidAudience,
    /// The credential could not be authenticated.
    Unauthenticated,
    /// The record store failed.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::PreconditionFailed => "precondition_failed",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::InvalidAudience => "invalid_audience",
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
