/// Configuration management for Engagement Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which document store backs the engine
    pub store: StoreBackend,
    /// Database configuration (postgres backend only)
    pub database: Option<DatabaseConfig>,
    /// Feed defaults
    pub feed: FeedConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => bail!("unknown STORE_BACKEND '{}' (expected memory or postgres)", other),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Limit used when a request does not carry one
    pub default_limit: usize,
    /// Requested limits above this are clamped
    pub max_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: 8,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

// Default values
fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

/// Parse an optional numeric env var, failing on garbage instead of silently defaulting
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}='{}': {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_parse("PORT", 8090)?,
        };

        let store = match std::env::var("STORE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StoreBackend::Memory,
        };

        let database = match store {
            StoreBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_parse("DB_MAX_CONNECTIONS", default_max_connections())?,
                min_connections: env_parse("DB_MIN_CONNECTIONS", default_min_connections())?,
                acquire_timeout_secs: env_parse(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    default_acquire_timeout_secs(),
                )?,
            }),
            StoreBackend::Memory => None,
        };

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            default_limit: env_parse("FEED_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: env_parse("FEED_MAX_LIMIT", defaults.max_limit)?,
        };
        if feed.default_limit == 0 {
            bail!("FEED_DEFAULT_LIMIT must be greater than zero");
        }
        if feed.max_limit < feed.default_limit {
            bail!(
                "FEED_MAX_LIMIT ({}) must not be below FEED_DEFAULT_LIMIT ({})",
                feed.max_limit,
                feed.default_limit
            );
        }

        let logging = LoggingConfig {
            format: match std::env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        Ok(Config {
            app,
            store,
            database,
            feed,
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "STORE_BACKEND",
        "DATABASE_URL",
        "DB_MAX_CONNECTIONS",
        "FEED_DEFAULT_LIMIT",
        "FEED_MAX_LIMIT",
        "LOG_FORMAT",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8090);
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.feed.default_limit, 8);
        assert_eq!(config.feed.max_limit, 100);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    #[serial]
    fn test_postgres_requires_database_url() {
        clear_env();
        std::env::set_var("STORE_BACKEND", "postgres");

        assert!(Config::from_env().is_err());

        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("DB_MAX_CONNECTIONS", "7");
        let config = Config::from_env().unwrap();
        let db = config.database.unwrap();
        assert_eq!(db.max_connections, 7);
        assert_eq!(db.min_connections, 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_rejects_invalid_values() {
        clear_env();

        std::env::set_var("FEED_DEFAULT_LIMIT", "0");
        assert!(Config::from_env().is_err());

        std::env::set_var("FEED_DEFAULT_LIMIT", "eight");
        assert!(Config::from_env().is_err());

        clear_env();
        std::env::set_var("STORE_BACKEND", "mongo");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
