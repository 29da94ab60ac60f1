//! In-memory transcript storage for one session

use super::message::{Message, Role, Transcript};
use super::state::TurnState;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cannot append a {role:?} message directly after another {role:?} message")]
    InvalidOrder { role: Role },
}

/// Ordered transcript plus the duplicate-submission marker
#[derive(Debug, Default)]
pub struct ConversationStore {
    transcript: Transcript,
    last_input: Option<String>,
}

impl ConversationStore {
    #[allow(dead_code)] // Engines start from `Default`
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, assigning the next sequence number.
    ///
    /// Fails if the previous turn has the same role.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> Result<&Transcript, StoreError> {
        if self.transcript.last().is_some_and(|last| last.role() == role) {
            return Err(StoreError::InvalidOrder { role });
        }

        let sequence = self.transcript.last().map_or(0, |last| last.sequence() + 1);
        self.transcript.push(Message::new(role, content.into(), sequence));
        Ok(&self.transcript)
    }

    pub fn snapshot(&self) -> Transcript {
        self.transcript.clone()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        TurnState::of(&self.transcript)
    }

    /// The most recent fully answered user utterance
    pub fn last_input(&self) -> Option<&str> {
        self.last_input.as_deref()
    }

    pub fn set_last_input(&mut self, input: impl Into<String>) {
        self.last_input = Some(input.into());
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
        self.last_input = None;
    }
}
