//! Configuration module for the chat completion client.

mod api;

pub use api::{
    load_env_file, load_project_env, ApiConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_API_MODEL, ENV_API_TIMEOUT_SECS, ENV_API_URL,
};
