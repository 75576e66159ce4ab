//! API credentials and endpoint configuration, read from the environment.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::logging::{ERROR_ICON, SUCCESS_ICON, WAIT_ICON};

/// Environment variable holding the API key (required).
pub const ENV_API_KEY: &str = "API_KEY";

/// Environment variable holding the default model name.
pub const ENV_API_MODEL: &str = "API_MODEL";

/// Environment variable holding the API base URL.
pub const ENV_API_URL: &str = "API_URL";

/// Environment variable holding the HTTP request timeout in seconds.
pub const ENV_API_TIMEOUT_SECS: &str = "API_TIMEOUT_SECS";

/// Model used when `API_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "moonshot-v1-8k";

/// Base URL used when `API_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default HTTP request timeout (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration errors. All of them are fatal at start-up.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API_KEY not found in environment variables")]
    MissingApiKey,
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Failed to load environment file: {0}")]
    EnvFile(#[from] dotenvy::Error),
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Credentials and endpoint for the chat completion API.
#[derive(Clone, PartialEq)]
pub struct ApiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Create a config with the given API key and default model, URL and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: normalize_base_url(DEFAULT_BASE_URL),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set the default model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL. Trailing slashes are dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(&base_url.into());
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let Some(api_key) = read(ENV_API_KEY) else {
            error!("{} {} not found in environment variables", ERROR_ICON, ENV_API_KEY);
            return Err(ConfigError::MissingApiKey);
        };

        let model = read(ENV_API_MODEL).unwrap_or_else(|| {
            info!("{} Using default model: {}", WAIT_ICON, DEFAULT_MODEL);
            DEFAULT_MODEL.to_string()
        });

        let base_url = match read(ENV_API_URL) {
            Some(url) => normalize_base_url(&url),
            None => {
                info!("{} {} not set, using {}", WAIT_ICON, ENV_API_URL, DEFAULT_BASE_URL);
                normalize_base_url(DEFAULT_BASE_URL)
            }
        };

        let timeout = match read(ENV_API_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: ENV_API_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}

/// `/chat/completions` is appended to the base URL verbatim, so it must not end in `/`.
fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Find the project's `.env` (current directory, then its ancestors) and load it
/// into the process environment, overriding variables that are already set.
///
/// Returns the path that was loaded, or `None` (with a warning) when no file exists.
pub fn load_project_env() -> Result<Option<PathBuf>, ConfigError> {
    match dotenvy::dotenv_override() {
        Ok(path) => {
            info!("{} Loaded environment file: {}", SUCCESS_ICON, path.display());
            Ok(Some(path))
        }
        Err(e) if e.not_found() => {
            warn!("{} No .env file found in the current directory or its parents", ERROR_ICON);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Load key-value pairs from `path` into the process environment.
///
/// Values in the file override variables that are already set. A missing file
/// is not an error: a warning is logged and `Ok(false)` returned.
pub fn load_env_file(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        warn!("{} Environment file not found: {}", ERROR_ICON, path.display());
        return Ok(false);
    }

    dotenvy::from_path_override(path)?;
    info!("{} Loaded environment file: {}", SUCCESS_ICON, path.display());
    Ok(true)
}
