//! Response generation
//!
//! The engine only knows the [`ResponseGenerator`] trait; the Groq client is
//! one implementation of it.

mod error;
mod groq;
mod types;

pub use error::{FailureCause, GenerationError};
pub use groq::{GroqConfig, GroqGenerator};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Produces the next assistant turn from an ordered history
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate a reply to `history`, which always ends in a user message
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ResponseGenerator + ?Sized> ResponseGenerator for Arc<T> {
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        (**self).generate(history).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for response generators
pub struct LoggingGenerator {
    inner: Arc<dyn ResponseGenerator>,
    model_id: String,
}

impl LoggingGenerator {
    pub fn new(inner: Arc<dyn ResponseGenerator>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl ResponseGenerator for LoggingGenerator {
    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(history).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history_len = history.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "Generation completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    cause = %e.cause,
                    error = %e.message,
                    retryable = e.cause.is_retryable(),
                    "Generation failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
