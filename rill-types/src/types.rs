//! Core transcript types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A human user.
    User,
    /// The model.
    Assistant,
}

impl Role {
    /// Wire name of the role (`"user"` / `"assistant"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, stable identifier of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Stable identifier, used to key in-place mutation while streaming.
    pub id: MessageId,
    /// Who produced the message.
    pub role: Role,
    /// Message text. Grows token by token while the message is in flight.
    pub content: String,
}

impl ChatMessage {
    /// Create a user message with a fresh id.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message with a fresh id.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered transcript of a chat.
///
/// Insertion order is chronological order. Messages are append-only, except
/// for the single in-flight assistant message, which receives tokens through
/// [`Conversation::append_to`] until [`Conversation::finish`] is called.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    in_flight: Option<MessageId>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message and return its id.
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        let message = ChatMessage::user(content);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Append an empty assistant message and mark it in flight.
    ///
    /// Returns `None` without touching the transcript when another message
    /// is already in flight.
    pub fn begin_assistant(&mut self) -> Option<MessageId> {
        if self.in_flight.is_some() {
            return None;
        }
        let message = ChatMessage::assistant(String::new());
        let id = message.id;
        self.messages.push(message);
        self.in_flight = Some(id);
        Some(id)
    }

    /// Append a user message and an empty in-flight assistant reply to it,
    /// returning the reply's id.
    ///
    /// Returns `None` without touching the transcript when another message
    /// is already in flight.
    pub fn begin_exchange(&mut self, user: impl Into<String>) -> Option<MessageId> {
        if self.in_flight.is_some() {
            return None;
        }
        self.push_user(user);
        self.begin_assistant()
    }

    /// Append `text` to the in-flight message identified by `id`.
    ///
    /// Returns `false` (and changes nothing) when `id` is not the in-flight
    /// message.
    pub fn append_to(&mut self, id: MessageId, text: &str) -> bool {
        if self.in_flight != Some(id) {
            return false;
        }
        match self.messages.iter_mut().rev().find(|m| m.id == id) {
            Some(message) => {
                message.content.push_str(text);
                true
            }
            None => false,
        }
    }

    /// Release the in-flight marker if it belongs to `id`.
    pub fn finish(&mut self, id: MessageId) {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }
    }

    /// The message currently receiving tokens, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&ChatMessage> {
        let id = self.in_flight?;
        self.get(id)
    }

    /// Look up a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// All messages in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Iterate messages in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message and the in-flight marker.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.in_flight = None;
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a ChatMessage;
    type IntoIter = std::slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
