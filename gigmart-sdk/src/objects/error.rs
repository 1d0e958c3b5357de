use serde::{Deserialize, Serialize};

/// JSON body of every non-2xx API response.
///
/// `error` is the stable error kind (`not_found`, `forbidden`,
/// `precondition_failed`, `upstream_failure`, `invalid_audience`,
/// `unauthenticated`, `internal`); `reason` is the specific cause, e.g.
/// `already_assigned` or `not_paid` for precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub reason: String,
}
