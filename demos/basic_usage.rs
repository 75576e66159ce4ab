//! Basic usage example: one chat completion configured from the environment.
//!
//! Run with: cargo run --example basic_usage -- "your question"

use chat_completion::{CompletionClient, CompletionOptions, MessageBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chat_completion::init_tracing();

    // Fails fast when API_KEY is missing
    let client = CompletionClient::from_env()?;

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "用一句话介绍一下你自己".to_string());
    let messages = MessageBuilder::prompt("You are a helpful assistant.", &question);

    println!("📝 Question: {}\n", question);

    match client
        .get_chat_completion(&messages, &CompletionOptions::default())
        .await
    {
        Some(answer) => println!("✅ {}", answer),
        None => eprintln!("❌ No response after retries, see logs for details"),
    }

    Ok(())
}
