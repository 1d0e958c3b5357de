//! Catalog listing types.

use serde::{Deserialize, Serialize};

/// A purchasable service listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: rust_decimal::Decimal,
    pub category: String,
    pub is_active: bool,
}

/// Query string for `GET /api/v1/services`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuery {
    pub category: Option<String>,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}
