//! Engine state

use super::message::{Role, Transcript};
use serde::Serialize;

/// Where a session stands in the turn-taking protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Transcript is empty or ends in an assistant turn
    Idle,
    /// Transcript ends in a user turn: either in flight or failed and waiting for a retry
    AwaitingResponse,
}

impl TurnState {
    pub fn of(transcript: &Transcript) -> Self {
        match transcript.last() {
            Some(msg) if msg.role() == Role::User => TurnState::AwaitingResponse,
            _ => TurnState::Idle,
        }
    }
}
