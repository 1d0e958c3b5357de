//! Principal roles and listener audiences.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The role a principal holds in the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Client,
    Worker,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Client => "client",
            UserRole::Worker => "worker",
            UserRole::Admin => "admin",
        }
    }

    /// The listener audience a principal of this role joins.
    pub fn audience(&self) -> AudienceRole {
        match self {
            UserRole::Client => AudienceRole::Clients,
            UserRole::Worker => AudienceRole::Workers,
            UserRole::Admin => AudienceRole::Admins,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(UserRole::Client),
            "worker" => Ok(UserRole::Worker),
            "admin" => Ok(UserRole::Admin),
            _ => Err(()),
        }
    }
}

/// A fixed listener category of the notification channel.
///
/// The wire tags are the plural role names (`clients`, `workers`,
/// `admins`); any other tag is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudienceRole {
    Clients,
    Workers,
    Admins,
}

impl AudienceRole {
    pub const ALL: [AudienceRole; 3] = [
        AudienceRole::Clients,
        AudienceRole::Workers,
        AudienceRole::Admins,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceRole::Clients => "clients",
            AudienceRole::Workers => "workers",
            AudienceRole::Admins => "admins",
        }
    }
}

impl std::fmt::Display for AudienceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an audience tag is not one of the recognized categories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audience tag: {0:?}")]
pub struct UnknownAudience(pub String);

impl FromStr for AudienceRole {
    type Err = UnknownAudience;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clients" => Ok(AudienceRole::Clients),
            "workers" => Ok(AudienceRole::Workers),
            "admins" => Ok(AudienceRole::Admins),
            other => Err(UnknownAudience(other.to_owned())),
        }
    }
}
