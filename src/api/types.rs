//! API request and response types

use crate::conversation::{Transcript, TurnState};
use crate::llm::FailureCause;
use crate::session::SessionEngine;
use serde::{Deserialize, Serialize};

/// Request to submit a user utterance
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub text: String,
}

/// Everything a client needs to render a session
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: String,
    pub state: TurnState,
    /// True while a reply is being generated
    pub generating: bool,
    pub messages: Transcript,
}

impl SessionView {
    pub async fn of(engine: &SessionEngine) -> Self {
        let status = engine.status().await;
        Self {
            id: engine.id().to_string(),
            state: status.state,
            generating: status.generating,
            messages: status.transcript,
        }
    }
}

/// Response for ending a session
#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub success: bool,
    pub farewell: String,
}

/// Service information
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub model: String,
    pub active_sessions: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureCause>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            cause: None,
        }
    }
}
