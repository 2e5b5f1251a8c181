//! Gateway configuration module
//!
//! Provides the tunables of the real-time gateway, a builder for
//! programmatic construction and TOML loading for deployments.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;

/// Default bind address of the gateway server
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default capacity of each connection's outbound queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Largest accepted outbound queue capacity
pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;

/// Default number of consecutive dropped events before a connection is closed
pub const DEFAULT_MAX_CONSECUTIVE_DROPS: u32 = 64;

/// Default name of the session cookie carrying the access token
pub const DEFAULT_SESSION_COOKIE: &str = "access_token";

/// Gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Capacity of each connection's outbound queue
    pub queue_capacity: usize,
    /// Consecutive drops tolerated before a connection is force-closed
    pub max_consecutive_drops: u32,
    /// Cookie checked first for the bearer credential
    pub session_cookie: String,
    /// Accept the credential from the `token` query parameter
    pub allow_query_token: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_consecutive_drops: DEFAULT_MAX_CONSECUTIVE_DROPS,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            allow_query_token: true,
        }
    }
}

impl GatewayConfig {
    /// Create a new GatewayConfigBuilder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid("queue_capacity", "must be greater than zero"));
        }
        if self.queue_capacity > MAX_QUEUE_CAPACITY {
            return Err(ConfigError::invalid(
                "queue_capacity",
                format!("must be at most {}", MAX_QUEUE_CAPACITY),
            ));
        }
        if self.max_consecutive_drops == 0 {
            return Err(ConfigError::invalid("max_consecutive_drops", "must be greater than zero"));
        }
        if self.session_cookie.trim().is_empty() {
            return Err(ConfigError::MissingValue("session_cookie"));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::invalid("bind_addr", format!("'{}' is not a socket address", self.bind_addr)))
    }
}

/// Builder for GatewayConfig
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    bind_addr: Option<String>,
    queue_capacity: Option<usize>,
    max_consecutive_drops: Option<u32>,
    session_cookie: Option<String>,
    allow_query_token: Option<bool>,
}

impl GatewayConfigBuilder {
    pub fn bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn max_consecutive_drops(mut self, drops: u32) -> Self {
        self.max_consecutive_drops = Some(drops);
        self
    }

    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = Some(name.into());
        self
    }

    pub fn allow_query_token(mut self, allow: bool) -> Self {
        self.allow_query_token = Some(allow);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        let defaults = GatewayConfig::default();
        let config = GatewayConfig {
            bind_addr: self.bind_addr.unwrap_or(defaults.bind_addr),
            queue_capacity: self.queue_capacity.unwrap_or(defaults.queue_capacity),
            max_consecutive_drops: self.max_consecutive_drops.unwrap_or(defaults.max_consecutive_drops),
            session_cookie: self.session_cookie.unwrap_or(defaults.session_cookie),
            allow_query_token: self.allow_query_token.unwrap_or(defaults.allow_query_token),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}
