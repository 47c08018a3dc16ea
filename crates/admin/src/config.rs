//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TYHUB_API_BASE_URL` - Base URL of the remote REST API (e.g., `http://10.0.0.5:5050/api/v1`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_SESSION_EXPIRY_HOURS` - Session inactivity expiry (default: 24)
//! - `TYHUB_API_TIMEOUT_SECS` - Request timeout for API calls (default: 30)
//! - `TYHUB_CACHE_CAPACITY` - Maximum number of cached API responses (default: 1000)
//! - `TYHUB_CACHE_TTL_SECS` - Lifetime of a cached API response (default: 300)
//! - `TYHUB_CACHE_STALE_SECS` - How long a cached response is served without
//!   asking the API again (default: 0, every page view revalidates). While an
//!   entry is fresh, a revoked token is not noticed.
//! - `TYHUB_CACHE_MAX_USERS` - Users whose caches are kept at once (default: 100)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sampling (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_STALE_SECS: u64 = 0;
const DEFAULT_CACHE_MAX_USERS: u64 = 100;
const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Session inactivity expiry in hours
    pub session_expiry_hours: i64,
    /// Remote REST API configuration
    pub api: ApiConfig,
    /// Query cache bounds
    pub cache: CacheConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Remote REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Query cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of entries per user.
    pub capacity: u64,
    /// Time-to-live of an entry.
    pub ttl: Duration,
    /// How long an entry is served without refetching.
    pub stale_time: Duration,
    /// Maximum number of users with a cache.
    pub max_users: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            stale_time: Duration::from_secs(DEFAULT_CACHE_STALE_SECS),
            max_users: DEFAULT_CACHE_MAX_USERS,
        }
    }
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

        let host = parse_env_or_default::<IpAddr>("ADMIN_HOST", "127.0.0.1")?;
        let port = parse_env_or_default::<u16>("ADMIN_PORT", "3001")?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        let session_expiry_hours = parse_env_or_default::<i64>(
            "ADMIN_SESSION_EXPIRY_HOURS",
            &DEFAULT_SESSION_EXPIRY_HOURS.to_string(),
        )?;

        let api = ApiConfig::from_env()?;
        let cache = CacheConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url,
            session_expiry_hours,
            api,
            cache,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the dashboard is served over HTTPS (controls the `Secure` cookie flag).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_api_base_url(&get_required_env("TYHUB_API_BASE_URL")?)?;
        let timeout_secs = parse_env_or_default::<u64>(
            "TYHUB_API_TIMEOUT_SECS",
            &DEFAULT_API_TIMEOUT_SECS.to_string(),
        )?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl CacheConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let capacity = parse_env_or_default::<u64>(
            "TYHUB_CACHE_CAPACITY",
            &DEFAULT_CACHE_CAPACITY.to_string(),
        )?;
        let ttl_secs = parse_env_or_default::<u64>(
            "TYHUB_CACHE_TTL_SECS",
            &DEFAULT_CACHE_TTL_SECS.to_string(),
        )?;

        let stale_secs = parse_env_or_default::<u64>(
            "TYHUB_CACHE_STALE_SECS",
            &DEFAULT_CACHE_STALE_SECS.to_string(),
        )?;
        let max_users = parse_env_or_default::<u64>(
            "TYHUB_CACHE_MAX_USERS",
            &DEFAULT_CACHE_MAX_USERS.to_string(),
        )?;

        Ok(Self {
            capacity,
            ttl: Duration::from_secs(ttl_secs),
            stale_time: Duration::from_secs(stale_secs),
            max_users,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and normalise the API base URL.
///
/// Only http/https are accepted. A trailing slash is ensured so that
/// `Url::join` appends endpoint paths instead of replacing the last segment.
fn parse_api_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("TYHUB_API_BASE_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            session_expiry_hours: 24,
            api: ApiConfig {
                base_url: parse_api_base_url("http://localhost:5050/api/v1").unwrap(),
                timeout: Duration::from_secs(30),
            },
            cache: CacheConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_is_secure() {
        let mut config = test_config();
        assert!(!config.is_secure());
        config.base_url = "https://admin.example.com".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_api_base_url_gets_trailing_slash() {
        let url = parse_api_base_url("http://192.168.113.86:5050/api/v1").unwrap();
        assert_eq!(url.as_str(), "http://192.168.113.86:5050/api/v1/");
        assert_eq!(
            url.join("orders/42/status").unwrap().as_str(),
            "http://192.168.113.86:5050/api/v1/orders/42/status"
        );
    }

    #[test]
    fn test_api_base_url_keeps_existing_slash() {
        let url = parse_api_base_url("https://api.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
    }

    #[test]
    fn test_api_base_url_rejects_other_schemes() {
        let err = parse_api_base_url("ftp://api.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_api_base_url("not a url").is_err());
    }

    #[test]
    fn test_cache_config_default() {
        let cache = CacheConfig::default();
        assert_eq!(cache.capacity, 1000);
        assert_eq!(cache.ttl, Duration::from_secs(300));
        assert_eq!(cache.stale_time, Duration::ZERO);
        assert_eq!(cache.max_users, 100);
    }
}
