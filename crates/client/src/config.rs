//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DUKKAN_API_BASE_URL` - Backend endpoint URL (routes are query params)
//!
//! ## Optional
//! - `DUKKAN_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `DUKKAN_DATA_DIR` - Override for the local persistence directory
//! - `DUKKAN_LANGUAGE` - Initial language code (default: en)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LANGUAGE: &str = "en";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend endpoint; route pseudo-paths ride as query parameters.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Local persistence directory; platform default when `None`.
    pub data_dir: Option<PathBuf>,
    /// Initial language code.
    pub language: String,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|err| {
            ConfigError::InvalidEnvVar("DUKKAN_API_BASE_URL".to_owned(), err.to_string())
        })?;

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            data_dir: None,
            language: DEFAULT_LANGUAGE.to_owned(),
        })
    }

    /// Load configuration from environment variables, honoring a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an explicit variable lookup.
    ///
    /// Kept separate from [`from_env`](Self::from_env) so tests can inject
    /// variables without touching the process environment.
    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = lookup("DUKKAN_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DUKKAN_API_BASE_URL".to_owned()))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup("DUKKAN_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                ConfigError::InvalidEnvVar(
                    "DUKKAN_REQUEST_TIMEOUT_SECS".to_owned(),
                    format!("not a number of seconds: {raw}"),
                )
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup("DUKKAN_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(language) = lookup("DUKKAN_LANGUAGE") {
            config.language = language;
        }

        Ok(config)
    }
}
