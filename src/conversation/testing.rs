//! Mock generators for testing
//!
//! These let engine and session tests run without network access.

use crate::llm::{GenerationError, LlmMessage, LlmResponse, ResponseGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Mock generator that returns queued results
pub struct MockGenerator {
    responses: Mutex<VecDeque<Result<LlmResponse, GenerationError>>>,
    model_id: String,
    delay: Option<Duration>,
    /// Record of every history passed in
    pub requests: Mutex<Vec<Vec<LlmMessage>>>,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

#[allow(dead_code)]
impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: "mock-model".to_string(),
            delay: None,
            requests: Mutex::new(Vec::new()),
            request_started: Arc::new(Notify::new()),
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful reply
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::from_text(text)));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: GenerationError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Drop any results that were queued but never consumed
    pub fn clear_queue(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn recorded_requests(&self) -> Vec<Vec<LlmMessage>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseGenerator for MockGenerator {
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        self.requests.lock().unwrap().push(history.to_vec());
        let result = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::transport("No mock response queued")));
        self.request_started.notify_one();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Generator that echoes the last user message back
pub struct EchoGenerator;

#[async_trait]
impl ResponseGenerator for EchoGenerator {
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        history
            .last()
            .map(|msg| LlmResponse::from_text(format!("echo: {}", msg.content)))
            .ok_or_else(|| GenerationError::malformed("Empty history"))
    }

    fn model_id(&self) -> &str {
        "echo"
    }
}

/// Generator whose every call panics
pub struct PanicGenerator;

#[async_trait]
impl ResponseGenerator for PanicGenerator {
    async fn generate(&self, _history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        panic!("generator blew up");
    }

    fn model_id(&self) -> &str {
        "panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FailureCause;

    #[tokio::test]
    async fn test_mock_generator() {
        let mock = MockGenerator::new();
        mock.queue_text("Hello");

        let history = vec![LlmMessage::user("hi")];
        let response = mock.generate(&history).await.unwrap();
        assert_eq!(response.text, "Hello");

        // Second call should fail (no more responses)
        let err = mock.generate(&history).await.unwrap_err();
        assert_eq!(err.cause, FailureCause::Transport);
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_echo_generator() {
        let reply = EchoGenerator
            .generate(&[LlmMessage::user("ping")])
            .await
            .unwrap();
        assert_eq!(reply.text, "echo: ping");
    }
}
