//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `API_BASE_URL` - Base URL of the backend REST API
//! - `STORAGE_BASE_URL` - Bucket URL prefixed to relative image paths
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `API_TIMEOUT_SECS` - Backend request timeout (default: 30, uploads included)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Backend API configuration
    pub api: ApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<SecretString>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("api", &self.api)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Prefix for image paths that are not absolute URLs
    pub storage_base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = &lookup;
        let env = Env(lookup);

        let base_url = get_required_env(&env, "ADMIN_BASE_URL")?;
        let api_base_url = get_required_env(&env, "API_BASE_URL")?;
        let api_base_url = Url::parse(&api_base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "API_BASE_URL".to_string(),
                    "must be an http(s) URL".to_string(),
                )
            })?;

        Ok(Self {
            host: parse_env_or_default(&env, "ADMIN_HOST", "127.0.0.1")?,
            port: parse_env_or_default(&env, "ADMIN_PORT", "3001")?,
            base_url,
            api: ApiConfig {
                base_url: api_base_url,
                storage_base_url: get_required_env(&env, "STORAGE_BASE_URL")?,
                timeout: Duration::from_secs(parse_env_or_default(
                    &env,
                    "API_TIMEOUT_SECS",
                    "30",
                )?),
            },
            sentry_dsn: get_optional_env(&env, "SENTRY_DSN").map(SecretString::from),
            sentry_environment: get_optional_env(&env, "SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default(&env, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default(
                &env,
                "SENTRY_TRACES_SAMPLE_RATE",
                "0.0",
            )?,
        })
    }

    /// Get the socket address to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

fn get_optional_env(env: &Env<'_>, key: &str) -> Option<String> {
    (env.0)(key).filter(|value| !value.trim().is_empty())
}

fn get_required_env(env: &Env<'_>, key: &str) -> Result<String, ConfigError> {
    get_optional_env(env, key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_env_or_default<T>(env: &Env<'_>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(env, key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "ADMIN_BASE_URL" => Some("https://admin.threadline.test".to_string()),
            "API_BASE_URL" => Some("http://api.local/api".to_string()),
            "STORAGE_BASE_URL" => Some("https://bucket.local".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
        assert_eq!(config.api.timeout, Duration::from_secs(30));
        assert!(config.is_secure());
    }

    #[test]
    fn test_rejects_non_base_api_url() {
        let err = AdminConfig::from_lookup(|key| match key {
            "API_BASE_URL" => Some("mailto:ops@threadline.test".to_string()),
            other => lookup(other),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "API_BASE_URL"));
    }

    #[test]
    fn test_missing_admin_base_url() {
        let err = AdminConfig::from_lookup(|key| match key {
            "ADMIN_BASE_URL" => None,
            other => lookup(other),
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "ADMIN_BASE_URL"));
    }
}
