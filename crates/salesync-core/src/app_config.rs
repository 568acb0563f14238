//! Environment-driven application configuration.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub catalog_request_timeout_secs: u64,
    pub catalog_user_agent: String,
    /// Bearer token for the catalog admin API, when the catalog requires one.
    pub catalog_token: Option<String>,
    /// Page size for collection → product expansion.
    pub catalog_page_limit: u32,
    pub catalog_inter_request_delay_ms: u64,
    pub catalog_max_retries: u32,
    pub catalog_retry_backoff_base_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "catalog_token",
                &self.catalog_token.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "catalog_request_timeout_secs",
                &self.catalog_request_timeout_secs,
            )
            .field("catalog_user_agent", &self.catalog_user_agent)
            .field("catalog_page_limit", &self.catalog_page_limit)
            .field(
                "catalog_inter_request_delay_ms",
                &self.catalog_inter_request_delay_ms,
            )
            .field("catalog_max_retries", &self.catalog_max_retries)
            .field(
                "catalog_retry_backoff_base_secs",
                &self.catalog_retry_backoff_base_secs,
            )
            .finish()
    }
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SALESYNC_ENV", "development"));
    let bind_addr = parse_addr("SALESYNC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SALESYNC_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SALESYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SALESYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SALESYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let catalog_request_timeout_secs = parse_u64("SALESYNC_CATALOG_REQUEST_TIMEOUT_SECS", "30")?;
    let catalog_user_agent = or_default(
        "SALESYNC_CATALOG_USER_AGENT",
        "salesync/0.1 (campaign-pricing)",
    );
    let catalog_token = lookup("SALESYNC_CATALOG_TOKEN").ok();
    let catalog_page_limit = parse_u32("SALESYNC_CATALOG_PAGE_LIMIT", "250")?;
    let catalog_inter_request_delay_ms = parse_u64("SALESYNC_CATALOG_INTER_REQUEST_DELAY_MS", "250")?;
    let catalog_max_retries = parse_u32("SALESYNC_CATALOG_MAX_RETRIES", "3")?;
    let catalog_retry_backoff_base_secs =
        parse_u64("SALESYNC_CATALOG_RETRY_BACKOFF_BASE_SECS", "5")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        catalog_request_timeout_secs,
        catalog_user_agent,
        catalog_token,
        catalog_page_limit,
        catalog_inter_request_delay_ms,
        catalog_max_retries,
        catalog_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "app_config_test.rs"]
mod tests;
