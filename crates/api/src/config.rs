//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_SECRET_KEY` - JWT signing key (min 32 chars, high entropy)
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string,
//!   unless `API_STORAGE=memory`
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 8000)
//! - `API_BASE_URL` - Absolute URL prefix for links (default: `http://<host>:<port>`)
//! - `API_STORAGE` - `postgres` or `memory` (default: postgres)
//! - `API_PAGE_SIZE` - Items per list page (default: 10)
//! - `API_ACCESS_TOKEN_LIFETIME_SECS` - Access token lifetime (default: 900)
//! - `API_REFRESH_TOKEN_LIFETIME_SECS` - Refresh token lifetime (default: 86400)
//! - `API_SEQUENCE_MAX` - Largest accepted `number` for `/create-nums-row/` (default: 1000)
//! - `API_MEDIA_DIR` - Directory served at `/media/` (default: media)
//! - `API_SEED_FILE` - YAML fixture loaded at startup
//! - `API_CORS_ORIGINS` - Comma-separated allowed origins
//! - `API_RATE_LIMIT` - Rate limit token endpoints per IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SECRET_KEY_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Absolute URL prefix for pagination links and media URLs (no trailing slash)
    pub base_url: String,
    /// Storage backend
    pub storage: StorageConfig,
    /// Token signing and lifetimes
    pub auth: AuthConfig,
    /// Items per list page
    pub page_size: u64,
    /// Largest accepted `number` for the numeric sequence endpoint
    pub sequence_max: u32,
    /// Directory served at `/media/`
    pub media_dir: PathBuf,
    /// Fixture file loaded at startup
    pub seed_file: Option<PathBuf>,
    /// Origins allowed by CORS; empty disables the CORS layer
    pub cors_origins: Vec<HeaderValue>,
    /// Whether the token endpoints are rate limited
    pub rate_limit: bool,
    /// Error tracking
    pub sentry: SentryConfig,
}

/// Storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// `PostgreSQL` via sqlx.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// Process-local tables; data is lost on exit.
    Memory,
}

impl StorageConfig {
    /// Backend name, as accepted by `API_STORAGE`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres { .. } => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Token configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing key
    pub secret_key: SecretString,
    /// Lifetime of access tokens
    pub access_token_lifetime: Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_lifetime: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"[REDACTED]")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

/// Sentry configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// DSN; Sentry is disabled when unset
    pub dsn: Option<String>,
    /// Environment name reported with events
    pub environment: Option<String>,
    /// Fraction of errors sent
    pub sample_rate: f32,
    /// Fraction of transactions traced
    pub traces_sample_rate: f32,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the secret key fails validation (length, placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host: IpAddr = parse_env_or_default("API_HOST", "127.0.0.1")?;
        let port: u16 = parse_env_or_default("API_PORT", "8000")?;
        let base_url = get_optional_env("API_BASE_URL")
            .unwrap_or_else(|| format!("http://{}", SocketAddr::new(host, port)));
        let base_url = validate_base_url(&base_url)?;

        let storage = match get_env_or_default("API_STORAGE", "postgres").as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: get_database_url("API_DATABASE_URL")?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "API_STORAGE".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };

        let secret_key = get_validated_secret("API_SECRET_KEY")?;
        validate_secret_key(&secret_key, "API_SECRET_KEY")?;

        let auth = AuthConfig {
            secret_key,
            access_token_lifetime: Duration::from_secs(parse_env_or_default(
                "API_ACCESS_TOKEN_LIFETIME_SECS",
                "900",
            )?),
            refresh_token_lifetime: Duration::from_secs(parse_env_or_default(
                "API_REFRESH_TOKEN_LIFETIME_SECS",
                "86400",
            )?),
        };

        let page_size: u64 = parse_env_or_default("API_PAGE_SIZE", "10")?;
        if page_size == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "API_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            base_url,
            storage,
            auth,
            page_size,
            sequence_max: parse_env_or_default("API_SEQUENCE_MAX", "1000")?,
            media_dir: PathBuf::from(get_env_or_default("API_MEDIA_DIR", "media")),
            seed_file: get_optional_env("API_SEED_FILE").map(PathBuf::from),
            cors_origins: parse_origins(get_optional_env("API_CORS_ORIGINS").as_deref())?,
            rate_limit: parse_bool("API_RATE_LIMIT", &get_env_or_default("API_RATE_LIMIT", "true"))?,
            sentry: SentryConfig {
                dsn: get_optional_env("SENTRY_DSN"),
                environment: get_optional_env("SENTRY_ENVIRONMENT"),
                sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
                traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
            },
        })
    }

    /// Configuration for an in-memory server on the default address.
    ///
    /// Rate limiting is off and Sentry is disabled.
    #[must_use]
    pub fn local(secret_key: SecretString) -> Self {
        let host = IpAddr::from([127, 0, 0, 1]);
        let port = 8000;
        Self {
            host,
            port,
            base_url: format!("http://{}", SocketAddr::new(host, port)),
            storage: StorageConfig::Memory,
            auth: AuthConfig {
                secret_key,
                access_token_lifetime: Duration::from_secs(900),
                refresh_token_lifetime: Duration::from_secs(86_400),
            },
            page_size: 10,
            sequence_max: 1000,
            media_dir: PathBuf::from("media"),
            seed_file: None,
            cors_origins: Vec::new(),
            rate_limit: false,
            sentry: SentryConfig::default(),
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Absolute URL prefix of uploaded images, ending in `/`.
    #[must_use]
    pub fn media_url(&self) -> String {
        format!("{}/media/", self.base_url)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Check the base URL is absolute and strip any trailing slash.
fn validate_base_url(value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            "API_BASE_URL".to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Parse a comma-separated origin list.
fn parse_origins(value: Option<&str>) -> Result<Vec<HeaderValue>, ConfigError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                ConfigError::InvalidEnvVar("API_CORS_ORIGINS".to_string(), e.to_string())
            })
        })
        .collect()
}

/// Validate that the signing key meets minimum length requirements.
fn validate_secret_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SECRET_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECRET_KEY_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
