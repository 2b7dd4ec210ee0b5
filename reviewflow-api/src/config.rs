/// Configuration management for the API server
///
/// Sources are layered with the `config` crate, later ones winning:
///
/// 1. Built-in defaults
/// 2. Optional TOML file (`REVIEWFLOW_CONFIG`, default `config/local.toml`)
/// 3. Environment variables `REVIEWFLOW__<SECTION>__<KEY>`
/// 4. `DATABASE_URL`, if set
///
/// A `.env` file is loaded first when present.
///
/// # Example
///
/// ```no_run
/// use reviewflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use reviewflow_shared::db::pool::DatabaseConfig as PoolConfig;
use serde::{Deserialize, Serialize};
use std::env;

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/local.toml";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub log: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// How long in-flight requests get after a shutdown signal
    pub graceful_shutdown_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            graceful_shutdown_seconds: 10,
        }
    }
}

/// Which directory implementation backs the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL (ignored by the memory backend)
    pub url: String,

    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let pool = PoolConfig::default();
        Self {
            backend: StorageBackend::Postgres,
            url: String::new(),
            max_connections: pool.max_connections,
            min_connections: pool.min_connections,
            connect_timeout_seconds: pool.connect_timeout_seconds,
        }
    }
}

impl DatabaseConfig {
    /// Pool settings for `reviewflow_shared::db::pool::create_pool`
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }
}

/// Global request rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained rate; 0 disables limiting
    pub requests_per_second: u32,

    /// Bucket capacity
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
            burst: 200,
        }
    }
}

impl RateLimitConfig {
    pub fn enabled(&self) -> bool {
        self.requests_per_second > 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Config {
    /// Loads configuration from defaults, file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A source contains values of the wrong type
    /// - The result fails [`Config::validate`]
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let path = env::var("REVIEWFLOW_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let defaults = Config::default();

        let settings = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", defaults.server.port)?
            .set_default(
                "server.graceful_shutdown_seconds",
                defaults.server.graceful_shutdown_seconds,
            )?
            .set_default("database.backend", "postgres")?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connect_timeout_seconds",
                defaults.database.connect_timeout_seconds,
            )?
            .set_default(
                "rate_limit.requests_per_second",
                defaults.rate_limit.requests_per_second,
            )?
            .set_default("rate_limit.burst", defaults.rate_limit.burst)?
            .set_default("log.format", "pretty")?
            .add_source(config::File::with_name(&path).required(false))
            .add_source(
                config::Environment::with_prefix("REVIEWFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.backend == StorageBackend::Postgres && self.database.url.trim().is_empty() {
            anyhow::bail!("database.url (or DATABASE_URL) is required for the postgres backend");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!("database.min_connections must not exceed database.max_connections");
        }
        if self.rate_limit.enabled() && self.rate_limit.burst == 0 {
            anyhow::bail!("rate_limit.burst must be at least 1 when rate limiting is enabled");
        }
        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config {
            database: DatabaseConfig {
                backend: StorageBackend::Memory,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_bind_address() {
        let mut config = memory_config();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.database.url = "postgresql://localhost/reviewflow".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_backend_needs_no_url() {
        assert!(memory_config().validate().is_ok());
    }

    #[test]
    fn test_burst_required_when_enabled() {
        let mut config = memory_config();
        config.rate_limit.burst = 0;
        assert!(config.validate().is_err());

        config.rate_limit.requests_per_second = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config_carries_limits() {
        let mut config = memory_config();
        config.database.url = "postgresql://db/reviewflow".to_string();
        config.database.max_connections = 42;

        let pool = config.database.pool_config();
        assert_eq!(pool.url, "postgresql://db/reviewflow");
        assert_eq!(pool.max_connections, 42);
        assert_eq!(pool.idle_timeout_seconds, Some(600));
    }

    #[test]
    fn test_enum_names() {
        let backend: StorageBackend = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(backend, StorageBackend::Memory);

        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
