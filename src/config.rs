// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is not a valid socket address: {value}")]
    InvalidAddr { key: &'static str, value: String },
    #[error("{key} must be a whole number of seconds, got {value}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub bind_addr: SocketAddr,
    pub session_ttl: Duration,
    pub admin_key: Option<String>,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            session_ttl: Duration::from_secs(3600),
            admin_key: None,
            static_dir: "public".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidAddr { key: "BIND_ADDR", value })?,
            None => defaults.bind_addr,
        };

        let session_ttl = match get("SESSION_TTL_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidNumber { key: "SESSION_TTL_SECS", value })?,
            None => defaults.session_ttl,
        };

        Ok(Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            bind_addr,
            session_ttl,
            admin_key: get("ADMIN_KEY"),
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }
}
