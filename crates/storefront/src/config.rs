//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_URL` - Catalog API base (e.g. `http://localhost:3001/api`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_CATALOG_PATH` - Catalog listing path (default: /articles)
//! - `AUTH_API_URL` - Auth API base (default: `BACKEND_URL`)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 60)
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `STOREFRONT_CURRENCY` - ISO currency for prices (default: EUR)
//! - `GOOGLE_CLIENT_ID` - Enables the Google sign-in button
//! - `SEARCH_DEBOUNCE_MS` - Suggestion quiet period (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use doux_core::CurrencyCode;
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Catalog and auth backend
    pub backend: BackendConfig,
    /// Currency every catalog price is shown in
    pub currency: CurrencyCode,
    /// Google Identity Services client id; `None` hides the Google button
    pub google_client_id: Option<String>,
    /// Quiet period before a typed search is answered
    pub search_debounce: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Where the catalog and auth endpoints live.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Catalog API base URL, without trailing slash
    pub url: String,
    /// Path of the catalog listing, starting with `/`
    pub catalog_path: String,
    /// Auth API base URL, without trailing slash
    pub auth_url: String,
    pub timeout: Duration,
    pub catalog_cache_ttl: Duration,
}

impl BackendConfig {
    /// Config pointing both APIs at `url` with default path and timings.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let url = url.trim_end_matches('/').to_owned();
        Self {
            auth_url: url.clone(),
            url,
            catalog_path: "/articles".to_owned(),
            timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(60),
        }
    }

    /// Full catalog listing URL.
    #[must_use]
    pub fn catalog_url(&self) -> String {
        format!("{}{}", self.url, self.catalog_path)
    }

    /// Full URL of an auth endpoint such as `/login`.
    #[must_use]
    pub fn auth_endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.auth_url)
    }
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.url("STOREFRONT_BASE_URL")?;

        let backend_url = env.url("BACKEND_URL")?;
        let auth_url = match env.optional("AUTH_API_URL") {
            Some(_) => env.url("AUTH_API_URL")?,
            None => backend_url.clone(),
        };
        let catalog_path = env.or_default("BACKEND_CATALOG_PATH", "/articles");
        let catalog_path = if catalog_path.starts_with('/') {
            catalog_path
        } else {
            format!("/{catalog_path}")
        };

        let backend = BackendConfig {
            url: backend_url,
            catalog_path,
            auth_url,
            timeout: Duration::from_secs(env.parse_or("BACKEND_TIMEOUT_SECS", "10")?),
            catalog_cache_ttl: Duration::from_secs(env.parse_or("CATALOG_CACHE_TTL_SECS", "60")?),
        };

        let currency = env.parse_or("STOREFRONT_CURRENCY", "EUR")?;
        let search_debounce = Duration::from_millis(env.parse_or("SEARCH_DEBOUNCE_MS", "300")?);

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            currency,
            google_client_id: env.optional("GOOGLE_CLIENT_ID"),
            search_debounce,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Minimal configuration for local use and tests.
    #[must_use]
    pub fn local(backend_url: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            backend: BackendConfig::new(backend_url),
            currency: CurrencyCode::default(),
            google_client_id: None,
            search_debounce: Duration::from_millis(300),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get a required absolute http(s) URL, without trailing slash.
    fn url(&self, key: &str) -> Result<String, ConfigError> {
        let raw = self.required(key)?;
        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme {}", url.scheme()),
            ));
        }
        Ok(raw.trim_end_matches('/').to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("STOREFRONT_BASE_URL", "https://shop.example.de"),
        ("BACKEND_URL", "http://localhost:3001/api/"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.backend.url, "http://localhost:3001/api");
        assert_eq!(config.backend.auth_url, "http://localhost:3001/api");
        assert_eq!(
            config.backend.catalog_url(),
            "http://localhost:3001/api/articles"
        );
        assert_eq!(config.backend.timeout, Duration::from_secs(10));
        assert_eq!(config.backend.catalog_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
        assert!(config.google_client_id.is_none());
        assert!(config.is_https());
    }

    #[test]
    fn test_missing_required() {
        let err = load(&REQUIRED[..1]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "BACKEND_URL"));
    }

    #[test]
    fn test_invalid_url() {
        let err = load(&[REQUIRED[0], ("BACKEND_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "BACKEND_URL"));

        let err = load(&[REQUIRED[0], ("BACKEND_URL", "ftp://files.example.de")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(..)));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("STOREFRONT_PORT", "8080"),
            ("AUTH_API_URL", "http://auth.internal"),
            ("BACKEND_CATALOG_PATH", "products"),
            ("STOREFRONT_CURRENCY", "usd"),
            ("GOOGLE_CLIENT_ID", "abc.apps.googleusercontent.com"),
            ("SEARCH_DEBOUNCE_MS", "0"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend.auth_endpoint("/login"), "http://auth.internal/login");
        assert_eq!(
            config.backend.catalog_url(),
            "http://localhost:3001/api/products"
        );
        assert_eq!(config.currency, CurrencyCode::USD);
        assert_eq!(config.search_debounce, Duration::ZERO);
        assert!(config.google_client_id.is_some());
    }

    #[test]
    fn test_invalid_numbers() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_PORT", "70000"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_CURRENCY", "XYZ"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_blank_optional_is_unset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("GOOGLE_CLIENT_ID", "  "));
        assert!(load(&vars).unwrap().google_client_id.is_none());
    }
}
