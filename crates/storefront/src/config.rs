//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_URL` - Base URL of the marketplace backend RPC endpoint
//! - `IDENTITY_PROVIDER_URL` - Login page of the identity provider
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout for backend calls (default: 30)
//! - `QUERY_CACHE_CAPACITY` - Maximum cached query results (default: 1000)
//! - `QUERY_CACHE_TTL_SECS` - Lifetime of a cached query result (default: 300)
//! - `TRUST_PROXY_HEADERS` - Rate limit by `X-Forwarded-For` / `X-Real-IP`
//!   instead of the peer address; only behind a proxy that sets them (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    /// Public base URL for the storefront (no trailing slash)
    pub base_url: String,
    /// Marketplace backend configuration
    pub backend: BackendConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Query cache configuration
    pub cache: CacheConfig,
    /// Key rate limits on proxy-supplied client addresses
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Marketplace backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL; RPC calls go to `{url}/rpc/{method}`.
    pub url: Url,
    /// Timeout applied to every backend request.
    pub timeout: Duration,
}

/// Identity provider settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Where `/auth/login` sends the browser.
    pub provider_url: Url,
}

/// Query cache sizing.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of cached query results.
    pub capacity: u64,
    /// How long a result stays fresh before it is fetched again.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl: Duration::from_secs(300),
        }
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

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parsed("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed("STOREFRONT_PORT", "3000")?;
        let base_url = env
            .required("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let backend = BackendConfig {
            url: env.url("BACKEND_URL")?,
            timeout: Duration::from_secs(env.parsed("BACKEND_TIMEOUT_SECS", "30")?),
        };
        let identity = IdentityConfig {
            provider_url: env.url("IDENTITY_PROVIDER_URL")?,
        };
        let cache = CacheConfig {
            capacity: env.parsed("QUERY_CACHE_CAPACITY", "1000")?,
            ttl: Duration::from_secs(env.parsed("QUERY_CACHE_TTL_SECS", "300")?),
        };

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            identity,
            cache,
            trust_proxy_headers: env.parsed("TRUST_PROXY_HEADERS", "false")?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .unwrap_or_else(|| default.to_string())
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn url(&self, key: &str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}
