//! Chat completion client with bounded exponential-backoff retries.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::backend::{BackendError, ChatBackend, ChatRequest, OpenAiBackend};
use super::retry::{retry_delay, Sleeper, TokioSleeper};
use crate::config::{load_env_file, load_project_env, ApiConfig, ConfigError};
use crate::logging::{ERROR_ICON, SUCCESS_ICON, WAIT_ICON};

/// Default number of attempts per request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;

/// Sampling temperature sent with every request.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Why a completion produced no text.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("API call failed: {0}")]
    Call(#[from] BackendError),
    #[error("API returned an empty response")]
    EmptyResponse,
    #[error("No model name configured")]
    EmptyModel,
    #[error("No attempts made (max_retries is 0)")]
    NoAttempts,
}

/// Per-request options.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Model override. `None` uses the client's configured model.
    pub model: Option<String>,
    /// Total number of attempts, including the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled after every failed attempt.
    pub initial_retry_delay: Duration,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: None,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl CompletionOptions {
    /// Use `model` instead of the configured default.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the total number of attempts.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay before the first retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.initial_retry_delay = delay;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Client for an OpenAI-compatible chat completion API.
///
/// Construct it once at start-up and pass it to whatever needs completions;
/// it is read-only afterwards and can be shared behind an `Arc`.
pub struct CompletionClient<B = OpenAiBackend, S = TokioSleeper> {
    backend: B,
    sleeper: S,
    default_model: String,
}

impl CompletionClient {
    /// Create a client for the given configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let backend = OpenAiBackend::new(config)?;
        info!(
            "{} Chat completion client initialized ({} @ {})",
            SUCCESS_ICON, config.model, config.base_url
        );
        Ok(Self::with_backend(backend, config.model.clone()))
    }

    /// Load the project's `.env` (searched from the current directory upwards),
    /// then build the client from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_project_env()?;
        let config = ApiConfig::from_env()?;
        Self::new(&config)
    }

    /// Load `path` into the environment if it exists, then build the client from the environment.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        load_env_file(path)?;
        let config = ApiConfig::from_env()?;
        Self::new(&config)
    }
}

impl<B: ChatBackend> CompletionClient<B, TokioSleeper> {
    /// Create a client on top of an arbitrary backend.
    pub fn with_backend(backend: B, default_model: impl Into<String>) -> Self {
        Self {
            backend,
            sleeper: TokioSleeper,
            default_model: default_model.into(),
        }
    }
}

impl<B: ChatBackend, S: Sleeper> CompletionClient<B, S> {
    /// Replace the sleeper used between attempts.
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> CompletionClient<B, T> {
        CompletionClient {
            backend: self.backend,
            sleeper,
            default_model: self.default_model,
        }
    }

    /// Model used when a request does not name one.
    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// The backend requests are sent through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send `messages` and return the first choice's text.
    ///
    /// Never fails: every error, after retries, becomes `None`. The distinct
    /// failure kinds are logged; use [`Self::try_chat_completion`] to get them.
    pub async fn get_chat_completion(
        &self,
        messages: &[Value],
        options: &CompletionOptions,
    ) -> Option<String> {
        self.try_chat_completion(messages, options).await.ok()
    }

    /// Send `messages` and return the first choice's text, or the last failure.
    ///
    /// Makes at most `options.max_retries` calls. A call error or an empty
    /// response is followed by a wait of `initial_retry_delay * 2^attempt`
    /// unless it was the last attempt.
    pub async fn try_chat_completion(
        &self,
        messages: &[Value],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);
        if model.trim().is_empty() {
            error!("{} No model name configured, request not sent", ERROR_ICON);
            return Err(CompletionError::EmptyModel);
        }

        let payload = Value::Array(messages.to_vec());
        info!("{} Using model: {}", WAIT_ICON, model);
        info!("Messages: {}", payload);

        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: options.temperature,
        };

        let max_retries = options.max_retries;
        let mut last_error = CompletionError::NoAttempts;

        for attempt in 0..max_retries {
            let number = attempt + 1;
            debug!("Attempt {}/{}", number, max_retries);

            last_error = match self.backend.complete(&request).await {
                Ok(Some(content)) => {
                    debug!("API raw response: {}", content);
                    info!("{} Received response", SUCCESS_ICON);
                    return Ok(content);
                }
                Ok(None) => {
                    warn!(
                        "{} Attempt {}/{}: API returned an empty response",
                        ERROR_ICON, number, max_retries
                    );
                    CompletionError::EmptyResponse
                }
                Err(e) => {
                    error!("{} Attempt {}/{} failed: {}", ERROR_ICON, number, max_retries, e);
                    CompletionError::Call(e)
                }
            };

            if number < max_retries {
                let delay = retry_delay(options.initial_retry_delay, attempt);
                info!("{} Waiting {:?} before retrying...", WAIT_ICON, delay);
                self.sleeper.sleep(delay).await;
            }
        }

        match &last_error {
            CompletionError::Call(e) => error!("{} Final error: {}", ERROR_ICON, e),
            CompletionError::NoAttempts => {
                warn!("{} max_retries is 0, request not sent", ERROR_ICON)
            }
            _ => warn!("{} No response after {} attempts", ERROR_ICON, max_retries),
        }

        Err(last_error)
    }
}
