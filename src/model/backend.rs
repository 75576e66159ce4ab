//! Chat completion backends.
//!
//! [`ChatBackend`] is the seam between the retry loop and the wire client, so
//! the loop can be driven by a stub in tests. [`OpenAiBackend`] is the
//! production implementation on top of `async-openai`.

use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};

/// Errors raised by a single backend call.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] OpenAIError),
}

/// A single chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    /// Messages in OpenAI format, passed through as given.
    pub messages: Vec<Value>,
    pub temperature: f32,
}

/// Something that can answer a chat completion request.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one request.
    ///
    /// Returns `Ok(None)` when the call succeeded but carried no content
    /// (no choices, or a first choice without text).
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>, BackendError>;
}

/// Backend talking to an OpenAI-compatible endpoint.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAiBackend {
    /// Create a backend bound to the configured base URL and API key.
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder().timeout(config.timeout).build()?;

        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.base_url)
            .with_api_key(&config.api_key);

        // Retries are owned by CompletionClient; stop async-openai from retrying on its own.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(no_retry);

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Convert pass-through JSON messages into the client's typed messages.
pub(crate) fn to_request_messages(
    messages: &[Value],
) -> Result<Vec<ChatCompletionRequestMessage>, BackendError> {
    messages
        .iter()
        .map(|message| serde_json::from_value(message.clone()).map_err(BackendError::from))
        .collect()
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<Option<String>, BackendError> {
        let messages = to_request_messages(&request.messages)?;

        let body = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .build()?;

        debug!("POST {}/chat/completions (model={})", self.base_url, request.model);
        let response = self.client.chat().create(body).await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_request_messages() {
        let messages = vec![
            json!({"role": "system", "content": "You are a helpful assistant"}),
            json!({"role": "user", "content": "hi"}),
            json!({"role": "assistant", "content": "hello"}),
        ];

        let converted = to_request_messages(&messages).unwrap();
        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(converted[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(converted[2], ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_to_request_messages_rejects_unknown_role() {
        let messages = vec![json!({"role": "narrator", "content": "once upon a time"})];
        let result = to_request_messages(&messages);
        assert!(matches!(result, Err(BackendError::InvalidMessage(_))));
    }

    #[test]
    fn test_backend_uses_configured_base_url() {
        let config = ApiConfig::new("sk-test").with_base_url("https://api.moonshot.cn/v1");
        let backend = OpenAiBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "https://api.moonshot.cn/v1");
    }

    /// Accept one HTTP request, answer it with `body`, and return the request line.
    async fn serve_once(listener: tokio::net::TcpListener, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        head.lines().next().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_trailing_slash_base_url_hits_chat_completions() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve_once(
            listener,
            r#"{"id":"cmpl-1","object":"chat.completion","created":1700000000,"model":"m1","choices":[{"index":0,"message":{"role":"assistant","content":"pong"},"finish_reason":"stop"}]}"#,
        ));

        let config = ApiConfig::new("sk-test")
            .with_base_url(format!("http://{}/v1/", addr))
            .with_timeout(Duration::from_secs(10));
        let backend = OpenAiBackend::new(&config).unwrap();

        let request = ChatRequest {
            model: "m1".to_string(),
            messages: vec![json!({"role": "user", "content": "ping"})],
            temperature: 0.3,
        };
        let content = backend.complete(&request).await.unwrap();
        let request_line = server.await.unwrap();

        assert_eq!(content.as_deref(), Some("pong"));
        assert_eq!(request_line, "POST /v1/chat/completions HTTP/1.1");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let config = ApiConfig::new("sk-test")
            .with_base_url("http://127.0.0.1:9/v1")
            .with_timeout(Duration::from_secs(5));
        let backend = OpenAiBackend::new(&config).unwrap();

        let request = ChatRequest {
            model: "m1".to_string(),
            messages: vec![json!({"role": "user", "content": "hi"})],
            temperature: 0.3,
        };

        let result = backend.complete(&request).await;
        assert!(matches!(result, Err(BackendError::OpenAI(_))));
    }
}
