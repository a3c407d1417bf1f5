use crate::error::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    /// Overridable through the `PORT` environment variable.
    pub port: u16,
}

/// Contains parameters for the product store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL connection string. Overridable through `DATABASE_URI`.
    pub url: String,
    pub max_connections: u32,
    /// How long to wait for a pooled connection before giving up.
    pub acquire_timeout_secs: u64,
    pub backend: StorageBackend,
}

/// Selects which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// A PostgreSQL database reached through `database.url`.
    #[default]
    Postgres,
    /// A process-local table. Nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    /// When set, logs go to a daily rolling file in this directory instead of stdout.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Settings {
    /// Rejects settings that would only fail later, at bind or connect time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be greater than zero".to_string(),
            ));
        }
        if self.database.backend == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must be set when the postgres backend is selected".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DatabaseSettings {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}
