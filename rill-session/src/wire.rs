//! Request body of `POST /api/chat`.

use rill_types::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// One history entry as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// `"user"` or `"assistant"`.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// JSON body of a streaming chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Full ordered history, ending with the new user message.
    pub messages: Vec<WireMessage>,
    /// Always `true`; the session only speaks the streaming protocol.
    pub stream: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_ollama_shape() {
        let req = ChatRequest {
            model: "llama3.2".into(),
            messages: vec![
                WireMessage::from(&ChatMessage::user("Hi")),
                WireMessage {
                    role: Role::Assistant,
                    content: "Hello".into(),
                },
            ],
            stream: true,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            serde_json::json!({
                "model": "llama3.2",
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"}
                ],
                "stream": true
            })
        );
    }
}
