use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schemas::{ChatMessage, ValidationError};

// ============================================================================
// Demo Chat - stateless echo bot, nothing is persisted
// ============================================================================

pub const GREETING: &str = "Hello! How can I assist you today?";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Value>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChatReply {
    pub reply: String,
}

/// Validate every message against the ChatMessage schema.
pub fn parse_messages(raw: Vec<Value>) -> Result<Vec<ChatMessage>, ValidationError> {
    raw.into_iter()
        .enumerate()
        .map(|(index, value)| {
            ChatMessage::validate(value)
                .map_err(|err| ValidationError::new(format!("messages[{index}].{}", err.field), err.reason))
        })
        .collect()
}

/// Echo the most recent user message, or greet when there is none.
pub fn demo_reply(messages: &[ChatMessage]) -> ChatReply {
    let reply = match messages.iter().rev().find(|m| m.role == "user") {
        Some(last_user) => format!(
            "You said: '{}'. I'm a demo bot in this dashboard.",
            last_user.content
        ),
        None => GREETING.to_string(),
    };
    ChatReply { reply }
}
