//! Model client module for chat completions.

mod backend;
mod client;
mod message;
mod retry;

pub use backend::{BackendError, ChatBackend, ChatRequest, OpenAiBackend};
pub use client::{
    CompletionClient, CompletionError, CompletionOptions, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY_SECS, DEFAULT_TEMPERATURE,
};
pub use message::MessageBuilder;
pub use retry::{retry_delay, Sleeper, TokioSleeper};
