//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_AUTH_SECRET` - Key the identity provider signs sign-in hand-offs with (at least 32 bytes)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_CURRENCY` - ISO 4217 currency orders are placed in (default: INR)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)
//! - `LOG_FORMAT` - `json` for JSON log lines, anything else for human-readable

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use kirana_core::CurrencyCode;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shortest accepted `STOREFRONT_AUTH_SECRET`.
const MIN_AUTH_SECRET_LEN: usize = 32;

/// How log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: Url,
    /// HMAC key shared with the identity provider
    pub auth_secret: SecretString,
    /// Currency every order is placed in
    pub currency: CurrencyCode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
    /// Log output format
    pub log_format: LogFormat,
}

impl StorefrontConfig {
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

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = var("STOREFRONT_DATABASE_URL")
            .or_else(|| var("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREFRONT_DATABASE_URL".to_string()))?;

        let host = parse_var(&var, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_var(&var, "STOREFRONT_PORT", "3000")?;
        let currency = parse_var(&var, "STOREFRONT_CURRENCY", "INR")?;

        let base_url = required(&var, "STOREFRONT_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let auth_secret = required(&var, "STOREFRONT_AUTH_SECRET")?;
        if auth_secret.len() < MIN_AUTH_SECRET_LEN {
            return Err(ConfigError::InvalidEnvVar(
                "STOREFRONT_AUTH_SECRET".to_string(),
                format!("must be at least {MIN_AUTH_SECRET_LEN} bytes"),
            ));
        }
        let auth_secret = SecretString::from(auth_secret);

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth_secret,
            currency,
            sentry_dsn: var("SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty()),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_var(&var, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_var(&var, "SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn required(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse a variable, falling back to `default` when unset.
fn parse_var<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_vars(|key| vars.get(key).cloned())
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    const MINIMAL: &[(&str, &str)] = &[
        ("STOREFRONT_DATABASE_URL", "postgres://localhost/kirana"),
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ("STOREFRONT_AUTH_SECRET", SECRET),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.currency, CurrencyCode::INR);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.sentry_dsn.is_none());
        assert!(!config.is_secure());
    }

    #[test]
    fn test_database_url_falls_back() {
        let config = load(&[
            ("DATABASE_URL", "postgres://fallback/db"),
            ("STOREFRONT_BASE_URL", "https://shop.example"),
            ("STOREFRONT_AUTH_SECRET", SECRET),
        ])
        .unwrap();

        assert_eq!(config.database_url.expose_secret(), "postgres://fallback/db");
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("STOREFRONT_AUTH_SECRET", SECRET),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STOREFRONT_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("STOREFRONT_PORT", "eighty"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "STOREFRONT_PORT"
        ));

        let mut vars = MINIMAL.to_vec();
        vars.push(("STOREFRONT_CURRENCY", "XYZ"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "STOREFRONT_CURRENCY"
        ));

        let vars = [
            ("STOREFRONT_DATABASE_URL", "postgres://localhost/kirana"),
            ("STOREFRONT_BASE_URL", "not a url"),
            ("STOREFRONT_AUTH_SECRET", SECRET),
        ];
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_json_logs_and_currency() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("LOG_FORMAT", "JSON"));
        vars.push(("STOREFRONT_CURRENCY", "usd"));
        let config = load(&vars).unwrap();

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let config = load(&[
            ("STOREFRONT_DATABASE_URL", "postgres://user:hunter2@db/kirana"),
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("STOREFRONT_AUTH_SECRET", SECRET),
        ])
        .unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains(SECRET));
    }

    #[test]
    fn test_auth_secret_is_required_and_long_enough() {
        let err = load(&MINIMAL[..2]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STOREFRONT_AUTH_SECRET"));

        let mut vars = MINIMAL[..2].to_vec();
        vars.push(("STOREFRONT_AUTH_SECRET", "short"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(ref k, _)) if k == "STOREFRONT_AUTH_SECRET"
        ));
    }
}
