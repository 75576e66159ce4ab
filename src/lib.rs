// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Chat Completion
//!
//! Environment-configured client for OpenAI-compatible chat completion APIs
//! (Moonshot/Kimi by default), with bounded exponential-backoff retries.
//!
//! Configuration comes from `API_KEY` (required), `API_MODEL` and `API_URL`,
//! optionally loaded from a `.env` file in the project root. A missing API
//! key fails construction; request failures never do. After the retry
//! budget is spent, [`CompletionClient::get_chat_completion`] returns `None`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chat_completion::{CompletionClient, CompletionOptions, MessageBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     chat_completion::init_tracing();
//!
//!     let client = CompletionClient::from_env()?;
//!     let messages = MessageBuilder::prompt("You are a concise assistant.", "Hi!");
//!
//!     match client
//!         .get_chat_completion(&messages, &CompletionOptions::default())
//!         .await
//!     {
//!         Some(reply) => println!("{}", reply),
//!         None => eprintln!("no response"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod model;

pub use config::{ApiConfig, ConfigError, DEFAULT_MODEL};
pub use logging::init_tracing;
pub use model::{
    BackendError, ChatBackend, ChatRequest, CompletionClient, CompletionError, CompletionOptions,
    MessageBuilder, OpenAiBackend, Sleeper, TokioSleeper,
};
