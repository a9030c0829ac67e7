//! Server configuration loaded from the environment.
//!
//! ```bash
//! LOCKBOX_ACTOR_HEADER=x-user-id        # header carrying the authenticated user id
//! LOCKBOX_METRICS_ENABLED=true          # serve /metrics on the health listener
//! LOCKBOX_REQUEST_TIMEOUT_SECS=30
//! LOCKBOX_MAX_BODY_BYTES=65536
//! ```

use std::env;
use std::time::Duration;

use axum::http::HeaderName;
use thiserror::Error;

pub const DEFAULT_ACTOR_HEADER: &str = "x-user-id";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Header the upstream identity provider puts the actor's user id in.
    pub actor_header: HeaderName,
    pub metrics_enabled: bool,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            actor_header: HeaderName::from_static(DEFAULT_ACTOR_HEADER),
            metrics_enabled: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid header name in {var}: {value}")]
    InvalidHeaderName { var: &'static str, value: String },

    #[error("Invalid boolean in {var}: {value}. Expected true/false/1/0")]
    InvalidBool { var: &'static str, value: String },

    #[error("Invalid value in {var}: {value}. Expected a positive integer")]
    InvalidNumber { var: &'static str, value: String },
}

fn parse_bool(var: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ConfigError::InvalidBool { var, value: v }),
        },
    }
}

fn parse_positive<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(v) => match v.trim().parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value: v }),
        },
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let actor_header = match env::var("LOCKBOX_ACTOR_HEADER") {
            Err(_) => HeaderName::from_static(DEFAULT_ACTOR_HEADER),
            Ok(v) => HeaderName::from_bytes(v.trim().to_lowercase().as_bytes()).map_err(|_| {
                ConfigError::InvalidHeaderName {
                    var: "LOCKBOX_ACTOR_HEADER",
                    value: v.clone(),
                }
            })?,
        };

        let metrics_enabled = parse_bool("LOCKBOX_METRICS_ENABLED", true)?;
        let timeout_secs =
            parse_positive("LOCKBOX_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let max_body_bytes = parse_positive("LOCKBOX_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        Ok(Self {
            actor_header,
            metrics_enabled,
            request_timeout: Duration::from_secs(timeout_secs),
            max_body_bytes,
        })
    }
}
