/**
 * Server Configuration
 *
 * This module loads the gateway settings and the optional PostgreSQL
 * connection.
 *
 * # Configuration Sources
 *
 * In increasing priority:
 * 1. Built-in defaults (`GatewayConfig::default()`)
 * 2. TOML file named by `HUDDLE_CONFIG`
 * 3. Environment overrides: `HUDDLE_BIND_ADDR`, `HUDDLE_QUEUE_CAPACITY`,
 *    `HUDDLE_MAX_CONSECUTIVE_DROPS`
 *
 * `JWT_SECRET` and `DATABASE_URL` are read from the environment only. A
 * `.env` file is loaded first if present.
 *
 * # Error Handling
 *
 * Invalid gateway settings abort startup. A missing or unreachable database
 * is logged and the server continues with in-memory collaborators.
 */

use crate::backend::auth::sessions::DEV_JWT_SECRET;
use crate::shared::{ConfigError, GatewayConfig};
use sqlx::PgPool;
use std::str::FromStr;

/// Everything needed to build the application
#[derive(Debug, Clone)]
pub struct Settings {
    pub gateway: GatewayConfig,
    pub jwt_secret: String,
    pub database_url: Option<String>,
}

impl Settings {
    /// Settings for in-process use: defaults plus an explicit secret, no database
    pub fn new(gateway: GatewayConfig, jwt_secret: impl Into<String>) -> Self {
        Self {
            gateway,
            jwt_secret: jwt_secret.into(),
            database_url: None,
        }
    }
}

/// Load settings from `.env`, the optional TOML file and the environment
pub fn load_settings() -> Result<Settings, ConfigError> {
    dotenv::dotenv().ok();

    let mut gateway = match std::env::var("HUDDLE_CONFIG") {
        Ok(path) => {
            tracing::info!(path = %path, "loading gateway config file");
            let source = std::fs::read_to_string(&path)?;
            GatewayConfig::from_toml_str(&source)?
        }
        Err(_) => GatewayConfig::default(),
    };

    if let Ok(addr) = std::env::var("HUDDLE_BIND_ADDR") {
        gateway.bind_addr = addr;
    }
    if let Some(capacity) = env_parse("HUDDLE_QUEUE_CAPACITY", "queue_capacity")? {
        gateway.queue_capacity = capacity;
    }
    if let Some(drops) = env_parse("HUDDLE_MAX_CONSECUTIVE_DROPS", "max_consecutive_drops")? {
        gateway.max_consecutive_drops = drops;
    }
    gateway.validate()?;

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set. Using the development secret; do not run this in production.");
        DEV_JWT_SECRET.to_string()
    });

    let database_url = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());

    Ok(Settings {
        gateway,
        jwt_secret,
        database_url,
    })
}

fn env_parse<T: FromStr>(var: &str, field: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ConfigError::invalid(field, format!("{}={:?}: {}", var, raw, e))),
        Err(_) => Ok(None),
    }
}

/// Connect to the database if a URL is configured
///
/// # Returns
///
/// - `Some(PgPool)` if the database is reachable
/// - `None` if no URL is configured or the connection fails
pub async fn load_database(database_url: Option<&str>) -> Option<PgPool> {
    let Some(database_url) = database_url else {
        tracing::warn!("DATABASE_URL not set. Using in-memory membership and presence.");
        return None;
    };

    tracing::info!("Connecting to database...");
    match PgPool::connect(database_url).await {
        Ok(pool) => {
            tracing::info!("Database connection pool created successfully");
            Some(pool)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create database connection pool");
            tracing::warn!("Using in-memory membership and presence.");
            None
        }
    }
}
