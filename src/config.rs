//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "";
pub const DEFAULT_API_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_API_PROXY_TARGET: &str = "http://localhost:8080";
pub const DEFAULT_SESSION_FILE: &str = ".hub-session.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prefix for every gateway request. Empty means "same origin".
    pub api_base_url: String,
    pub timeout: Duration,
    /// Upstream for the local dev proxy. Never read by the gateway.
    pub proxy_target: String,
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: Duration::from_millis(DEFAULT_API_TIMEOUT_MS),
            proxy_target: DEFAULT_API_PROXY_TARGET.to_owned(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `API_BASE_URL`: default empty
    /// - `API_TIMEOUT_MS`: default 10000
    /// - `API_PROXY_TARGET`: default `http://localhost:8080`
    /// - `HUB_SESSION_FILE`: default `.hub-session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if `API_TIMEOUT_MS` is set but is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env_or("API_BASE_URL", DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_owned();
        let timeout_ms = env_parse_u64("API_TIMEOUT_MS", DEFAULT_API_TIMEOUT_MS)?;
        let proxy_target = env_or("API_PROXY_TARGET", DEFAULT_API_PROXY_TARGET);
        let session_file = PathBuf::from(env_or("HUB_SESSION_FILE", DEFAULT_SESSION_FILE));

        Ok(Self { api_base_url, timeout: Duration::from_millis(timeout_ms), proxy_target, session_file })
    }
}

/// Empty values count as unset, matching how the console's build tooling
/// treats blank environment entries.
fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_owned(),
        _ => default.to_owned(),
    }
}

fn env_parse_u64(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Ok(raw) = std::env::var(key) else {
        return Ok(default);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { var: key, value: raw.to_owned() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
