//! Helpers for building chat messages in OpenAI format.

use serde_json::{json, Value};

/// Helper for building conversation messages.
pub struct MessageBuilder;

impl MessageBuilder {
    /// Create a message with an arbitrary role.
    pub fn create_message(role: &str, content: &str) -> Value {
        json!({
            "role": role,
            "content": content
        })
    }

    /// Create a system message.
    pub fn create_system_message(content: &str) -> Value {
        Self::create_message("system", content)
    }

    /// Create a user message.
    pub fn create_user_message(content: &str) -> Value {
        Self::create_message("user", content)
    }

    /// Create an assistant message.
    pub fn create_assistant_message(content: &str) -> Value {
        Self::create_message("assistant", content)
    }

    /// Build the common system + user prompt pair.
    pub fn prompt(system: &str, user: &str) -> Vec<Value> {
        vec![
            Self::create_system_message(system),
            Self::create_user_message(user),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_builder() {
        let system_msg = MessageBuilder::create_system_message("You are an assistant");
        assert_eq!(system_msg["role"], "system");
        assert_eq!(system_msg["content"], "You are an assistant");

        let user_msg = MessageBuilder::create_user_message("Hello");
        assert_eq!(user_msg["role"], "user");

        let assistant_msg = MessageBuilder::create_assistant_message("Hi there");
        assert_eq!(assistant_msg["role"], "assistant");
    }

    #[test]
    fn test_prompt_pair() {
        let messages = MessageBuilder::prompt("Be brief", "What is Rust?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], "What is Rust?");
    }
}
