//! Configuration for the planner API service.

use planner_auth_core::AuthConfig;
use planner_db::PoolOptions;
use std::str::FromStr;
use std::time::Duration;

/// Planner API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Connection pool sizing
    pub pool: PoolOptions,

    /// Auth core configuration
    pub auth: AuthConfig,

    /// How often inactive sessions are purged; `None` disables the task
    pub session_purge_interval: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http_port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;

        // Database: full URL wins over the individual parts
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let port = parse_or(&lookup, "DB_PORT", 5432u16)?;
                let user = lookup("DB_USER").unwrap_or_else(|| "postgres".to_string());
                let password = lookup("DB_PASSWORD").unwrap_or_default();
                let name = lookup("DB_NAME").unwrap_or_else(|| "planner".to_string());
                let ssl_mode = lookup("DB_SSL_MODE").unwrap_or_else(|| "disable".to_string());
                format!("postgres://{user}:{password}@{host}:{port}/{name}?sslmode={ssl_mode}")
            }
        };

        let pool = PoolOptions {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 25u32)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 5u32)?,
            ..PoolOptions::default()
        };

        // JWT secret (minimum 32 bytes, enforced by AuthConfig)
        let jwt_secret =
            lookup("JWT_SECRET_KEY").ok_or(ConfigError::Missing("JWT_SECRET_KEY"))?;

        let access_token_secs = parse_or(&lookup, "ACCESS_TOKEN_DURATION_SECS", 3600u64)?;
        let refresh_token_hours = parse_or(&lookup, "REFRESH_TOKEN_DURATION_HOURS", 168u64)?;
        if access_token_secs == 0 {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_DURATION_SECS"));
        }
        let refresh_token_secs = refresh_token_hours
            .checked_mul(3600)
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::Invalid("REFRESH_TOKEN_DURATION_HOURS"))?;

        let purge_secs = parse_or(&lookup, "SESSION_PURGE_INTERVAL_SECS", 3600u64)?;

        let auth = AuthConfig::try_new(jwt_secret.as_bytes())
            .map_err(|e| ConfigError::AuthConfig(e.to_string()))?
            .with_access_token_duration(Duration::from_secs(access_token_secs))
            .with_refresh_token_duration(Duration::from_secs(refresh_token_secs));

        Ok(Self {
            http_port,
            database_url,
            pool,
            auth,
            session_purge_interval: (purge_secs > 0).then(|| Duration::from_secs(purge_secs)),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Auth config error: {0}")]
    AuthConfig(String),
}
