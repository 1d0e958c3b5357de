//! Configuration module for gigmart-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{CatalogEntry, FileConfig};
use gigmart_core::config::{AuthConfig, PaymentConfig, ServerConfig, SharedConfig};
use gigmart_core::entities::service_listings::ServiceListing;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable overriding `[payment] stripe_secret_key`.
pub const STRIPE_SECRET_KEY_ENV: &str = "STRIPE_SECRET_KEY";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
    pub catalog: Vec<ServiceListing>,
}

impl LoadedConfig {
    /// Split into the reloadable shared sections and the catalog seed.
    pub fn into_shared(self) -> (SharedConfig, Vec<ServiceListing>) {
        (
            SharedConfig::new(self.server, self.auth, self.payment),
            self.catalog,
        )
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let stripe_key = std::env::var(STRIPE_SECRET_KEY_ENV).ok();
        self.load_str(&config_content, stripe_key)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    pub(crate) fn load_str(
        &self,
        content: &str,
        stripe_key: Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }
        if let Some(key) = stripe_key.filter(|k| !k.is_empty()) {
            file_config.payment.stripe_secret_key = key;
        }

        validate(&file_config)?;
        if file_config.payment.stripe_secret_key.is_empty() {
            tracing::warn!("No payment provider key configured; payment calls will be rejected");
        }

        Ok(build_loaded_config(file_config))
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.auth.token_secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "auth.token_secret must not be empty".to_string(),
        ));
    }
    if config.auth.token_max_age_secs <= 0 {
        return Err(ConfigError::ValidationError(
            "auth.token_max_age_secs must be positive".to_string(),
        ));
    }
    if config.payment.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "payment.timeout_secs must be positive".to_string(),
        ));
    }
    let currency = &config.payment.currency;
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::ValidationError(format!(
            "payment.currency {currency:?} is not a three-letter code"
        )));
    }
    let mut seen = HashSet::new();
    for entry in &config.catalog {
        if !seen.insert(entry.id) {
            return Err(ConfigError::ValidationError(format!(
                "catalog id {} is listed more than once",
                entry.id
            )));
        }
        if entry.price.is_sign_negative() {
            return Err(ConfigError::ValidationError(format!(
                "catalog id {} has a negative price",
                entry.id
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        auth: AuthConfig::new(
            file_config.auth.token_secret.into_bytes(),
            file_config.auth.token_max_age_secs,
        ),
        payment: PaymentConfig {
            secret_key: file_config.payment.stripe_secret_key,
            api_base: file_config.payment.api_base,
            currency: file_config.payment.currency.to_ascii_lowercase(),
            timeout: Duration::from_secs(file_config.payment.timeout_secs),
        },
        catalog: file_config.catalog.into_iter().map(convert_listing).collect(),
    }
}

fn convert_listing(entry: CatalogEntry) -> ServiceListing {
    ServiceListing {
        id: entry.id,
        name: entry.name,
        description: entry.description,
        price: entry.price,
        category: entry.category,
        is_active: entry.is_active,
    }
}

/// Get the database URL from the environment, if one is configured.
pub fn get_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}
