//! Store configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Which BillingStore implementation to wire up
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Direct PostgreSQL connection
    Postgres,
    /// Hosted database REST interface
    #[default]
    Postgrest,
    /// Process-local maps; development and tests only
    Memory,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Postgres => "postgres",
            StoreBackend::Postgrest => "postgrest",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// PostgreSQL connection URL (postgres backend)
    #[serde(default)]
    pub database_url: String,

    /// Minimum connections to maintain
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Maximum connections allowed
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,

    /// Project URL of the hosted database (postgrest backend)
    #[serde(default)]
    pub rest_url: String,

    /// Service-role key for the REST interface (postgrest backend)
    #[serde(default)]
    pub service_key: Option<SecretString>,
}

impl StoreConfig {
    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    /// Validate the settings the selected backend needs
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        match self.backend {
            StoreBackend::Postgres => self.validate_postgres(),
            StoreBackend::Postgrest => self.validate_postgrest(),
            StoreBackend::Memory => {
                if *environment == Environment::Production {
                    return Err(ValidationError::MemoryStoreInProduction);
                }
                Ok(())
            }
        }
    }

    fn validate_postgres(&self) -> Result<(), ValidationError> {
        if self.database_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORE__DATABASE_URL"));
        }
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }

    fn validate_postgrest(&self) -> Result<(), ValidationError> {
        if self.rest_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORE__REST_URL"));
        }
        if !self.rest_url.starts_with("https://") && !self.rest_url.starts_with("http://") {
            return Err(ValidationError::InvalidRestUrl);
        }
        let has_key = self
            .service_key
            .as_ref()
            .map(|k| !k.expose_secret().is_empty())
            .unwrap_or(false);
        if !has_key {
            return Err(ValidationError::MissingRequired("STORE__SERVICE_KEY"));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            database_url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            rest_url: String::new(),
            service_key: None,
        }
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    1800
}
