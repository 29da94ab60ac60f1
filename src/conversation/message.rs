//! Transcript types

use crate::llm::{LlmMessage, MessageRole};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who authored a turn
pub type Role = MessageRole;

/// A single turn. Fields are private so a recorded message can't change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    role: Role,
    content: String,
    sequence: u64,
    created_at: DateTime<Utc>,
}

impl Message {
    pub(super) fn new(role: Role, content: String, sequence: u64) -> Self {
        Self {
            role,
            content,
            sequence,
            created_at: Utc::now(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[allow(dead_code)] // Exposed to clients through serialization
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_llm_message(&self) -> LlmMessage {
        LlmMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Ordered history of turns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

#[allow(dead_code)] // Read-only view for presentation clients
impl Transcript {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// History in the shape a generator expects
    pub fn to_history(&self) -> Vec<LlmMessage> {
        self.messages.iter().map(Message::to_llm_message).collect()
    }

    pub(super) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(super) fn clear(&mut self) {
        self.messages.clear();
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
