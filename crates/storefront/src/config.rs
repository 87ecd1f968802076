//! Theme service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ZID_STORE_ID` - Zid store identifier sent with every storefront API call
//!
//! ## Optional
//! - `THEME_HOST` - Bind address (default: 127.0.0.1)
//! - `THEME_PORT` - Listen port (default: 3000)
//! - `THEME_BASE_URL` - Public URL of the storefront (default: <http://localhost:3000>)
//! - `THEME_LANGUAGE` - Storefront language sent as `Accept-Language` (default: ar)
//! - `THEME_CURRENCY` - Store currency code for loyalty labels (default: SAR)
//! - `THEME_LOYALTY_OPTION_LABEL` - Redemption option template with
//!   `%(points)s` and `%(discount)s` placeholders
//! - `THEME_TIME_AGO_LABELS` - JSON object of relative-time labels
//! - `ZID_API_URL` - Storefront API base URL (default: <https://api.zid.sa/v1>)
//! - `ZID_API_TOKEN` - Storefront API token. When unset, the storefront API is
//!   treated as unavailable and cart refreshes become no-ops.
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;
use zid_theme_core::time_ago::TimeAgoLabels;

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

/// Theme service configuration.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Store currency code (e.g., SAR)
    pub currency_code: String,
    /// Redemption option label template
    pub loyalty_option_label: Option<String>,
    /// Relative-time labels
    pub time_ago_labels: TimeAgoLabels,
    /// Zid storefront API configuration
    pub zid: ZidApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Zid storefront API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ZidApiConfig {
    /// API base URL
    pub base_url: Url,
    /// Store identifier
    pub store_id: String,
    /// Bearer token; `None` means the API is not configured
    pub access_token: Option<SecretString>,
    /// Language for localized responses
    pub language: String,
}

impl std::fmt::Debug for ZidApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZidApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("store_id", &self.store_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("language", &self.language)
            .finish()
    }
}

impl ThemeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("THEME_HOST", "127.0.0.1")?;
        let port = parse_env("THEME_PORT", "3000")?;
        let base_url = get_env_or_default("THEME_BASE_URL", "http://localhost:3000");
        let currency_code = get_env_or_default("THEME_CURRENCY", "SAR");
        let loyalty_option_label = get_optional_env("THEME_LOYALTY_OPTION_LABEL");
        let time_ago_labels = get_optional_env("THEME_TIME_AGO_LABELS")
            .map(|raw| TimeAgoLabels::from_json(&raw))
            .unwrap_or_default();

        let zid = ZidApiConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            currency_code,
            loyalty_option_label,
            time_ago_labels,
            zid,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl ZidApiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_api_url(&get_env_or_default("ZID_API_URL", "https://api.zid.sa/v1"))?;
        let access_token = get_optional_env("ZID_API_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "ZID_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Self {
            base_url,
            store_id: get_required_env("ZID_STORE_ID")?,
            access_token,
            language: get_env_or_default("THEME_LANGUAGE", "ar"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// The API base must be an absolute http(s) URL so paths can be appended.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("ZID_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "ZID_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
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
    let len = s.len() as f64;
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
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the token issued by Zid."
            ),
        ));
    }

    Ok(())
}
