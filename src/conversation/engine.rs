//! Turn engine
//!
//! Accepts user utterances, records them, asks the generator for a reply and
//! records that too. The store lock is never held across the generator call,
//! so `AwaitingResponse` stays observable while a reply is in flight.

use super::message::{Role, Transcript};
use super::state::TurnState;
use super::store::{ConversationStore, StoreError};
use crate::llm::{GenerationError, LlmMessage, LlmResponse, ResponseGenerator};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Errors surfaced by [`TurnEngine`]
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("A response is already being generated for this session")]
    Busy,
    #[error("The last message is still unanswered; retry it or clear the conversation")]
    PendingRetry,
    #[error(transparent)]
    InvalidOrder(#[from] StoreError),
    #[error("Response generation failed: {0}")]
    GenerationFailed(#[from] GenerationError),
    #[error("Response generation was interrupted: {0}")]
    Interrupted(String),
}

/// Consistent view of an engine at one instant
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub transcript: Transcript,
    pub state: TurnState,
    pub generating: bool,
}

/// Turn-taking engine for a single session.
///
/// Cloning is cheap and yields a handle to the same session.
pub struct TurnEngine<G> {
    shared: Arc<Shared<G>>,
}

impl<G> Clone for TurnEngine<G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<G> {
    id: String,
    generator: G,
    timeout: Option<Duration>,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    store: ConversationStore,
    /// Set while a generator call is running
    in_flight: Option<InFlight>,
    /// Bumped by `clear`; replies started under an older epoch are dropped
    epoch: u64,
}

struct InFlight {
    cancel: CancellationToken,
    utterance: String,
}

/// A user turn that has been recorded and now needs a reply
struct PendingTurn {
    history: Vec<LlmMessage>,
    utterance: String,
    cancel: CancellationToken,
    epoch: u64,
}

impl Inner {
    fn begin(&mut self, utterance: String) -> PendingTurn {
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            cancel: cancel.clone(),
            utterance: utterance.clone(),
        });
        PendingTurn {
            history: self.store.transcript().to_history(),
            utterance,
            cancel,
            epoch: self.epoch,
        }
    }

    /// Release the in-flight slot, unless a `clear` already handed it to a newer turn
    fn release(&mut self, epoch: u64) {
        if self.epoch == epoch {
            self.in_flight = None;
        }
    }

    fn in_flight_input(&self) -> Option<&str> {
        self.in_flight.as_ref().map(|turn| turn.utterance.as_str())
    }
}

impl<G: ResponseGenerator + 'static> TurnEngine<G> {
    #[allow(dead_code)] // Sessions go through `with_optional_timeout`
    pub fn new(id: impl Into<String>, generator: G) -> Self {
        Self::with_optional_timeout(id, generator, None)
    }

    /// Fail generator calls that take longer than `timeout`
    #[allow(dead_code)]
    pub fn with_timeout(id: impl Into<String>, generator: G, timeout: Duration) -> Self {
        Self::with_optional_timeout(id, generator, Some(timeout))
    }

    pub fn with_optional_timeout(
        id: impl Into<String>,
        generator: G,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                generator,
                timeout,
                inner: RwLock::new(Inner::default()),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.shared.id
    }

    /// Submit a user utterance and wait for the assistant's reply.
    ///
    /// Blank input and a repeat of the last accepted utterance (answered or
    /// still in flight) are no-ops that return the transcript unchanged.
    pub async fn submit(&self, utterance: &str) -> Result<Transcript, TurnError> {
        let pending = {
            let mut inner = self.shared.inner.write().await;
            let text = utterance.trim();

            if text.is_empty() {
                tracing::debug!(session_id = %self.shared.id, "Ignoring empty submission");
                return Ok(inner.store.snapshot());
            }
            if inner.store.last_input() == Some(text) || inner.in_flight_input() == Some(text) {
                tracing::debug!(session_id = %self.shared.id, "Ignoring duplicate submission");
                return Ok(inner.store.snapshot());
            }
            if inner.in_flight.is_some() {
                return Err(TurnError::Busy);
            }
            if inner.store.state() == TurnState::AwaitingResponse {
                return Err(TurnError::PendingRetry);
            }

            inner.store.append(Role::User, text)?;
            tracing::info!(
                session_id = %self.shared.id,
                turns = inner.store.transcript().len(),
                "User turn recorded"
            );
            inner.begin(text.to_string())
        };

        self.run(pending).await
    }

    /// Re-run generation for an unanswered user turn.
    ///
    /// A no-op when the last turn already has a reply.
    pub async fn retry_last(&self) -> Result<Transcript, TurnError> {
        let pending = {
            let mut inner = self.shared.inner.write().await;
            if inner.in_flight.is_some() {
                return Err(TurnError::Busy);
            }

            let Some(last) = inner
                .store
                .transcript()
                .last()
                .filter(|msg| msg.role() == Role::User)
            else {
                tracing::debug!(session_id = %self.shared.id, "Nothing to retry");
                return Ok(inner.store.snapshot());
            };

            let utterance = last.content().to_string();
            tracing::info!(session_id = %self.shared.id, "Retrying unanswered turn");
            inner.begin(utterance)
        };

        self.run(pending).await
    }

    /// Drop the transcript and cancel any in-flight generation
    pub async fn clear(&self) {
        let mut inner = self.shared.inner.write().await;
        if let Some(turn) = inner.in_flight.take() {
            turn.cancel.cancel();
            tracing::info!(session_id = %self.shared.id, "Cancelled in-flight generation");
        }
        inner.epoch += 1;
        inner.store.clear();
        tracing::info!(session_id = %self.shared.id, "Conversation cleared");
    }

    #[allow(dead_code)] // Presentation uses `status`
    pub async fn snapshot(&self) -> Transcript {
        self.shared.inner.read().await.store.snapshot()
    }

    #[allow(dead_code)]
    pub async fn state(&self) -> TurnState {
        self.shared.inner.read().await.store.state()
    }

    #[allow(dead_code)]
    pub async fn is_generating(&self) -> bool {
        self.shared.inner.read().await.in_flight.is_some()
    }

    pub async fn status(&self) -> EngineStatus {
        let inner = self.shared.inner.read().await;
        EngineStatus {
            transcript: inner.store.snapshot(),
            state: inner.store.state(),
            generating: inner.in_flight.is_some(),
        }
    }

    /// Generation runs on its own task so the turn still completes if the
    /// caller stops waiting.
    ///
    /// If that task panics or is aborted the slot is released and the user
    /// turn stays unanswered, so `retry_last` can pick it up.
    async fn run(&self, pending: PendingTurn) -> Result<Transcript, TurnError> {
        let epoch = pending.epoch;
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move { shared.finish(pending).await });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                // The task never finished, so nobody else will release the slot
                self.shared.inner.write().await.release(epoch);
                let reason = if e.is_panic() {
                    "generator panicked".to_string()
                } else {
                    e.to_string()
                };
                tracing::error!(
                    session_id = %self.shared.id,
                    reason = %reason,
                    "Generation task died"
                );
                Err(TurnError::Interrupted(reason))
            }
        }
    }
}

impl<G: ResponseGenerator> Shared<G> {
    async fn finish(&self, pending: PendingTurn) -> Result<Transcript, TurnError> {
        let PendingTurn {
            history,
            utterance,
            cancel,
            epoch,
        } = pending;

        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            result = self.generate(&history) => Some(result),
        };

        let mut inner = self.inner.write().await;
        let Some(result) = outcome.filter(|_| inner.epoch == epoch) else {
            tracing::info!(session_id = %self.id, "Conversation cleared during generation; reply discarded");
            return Ok(inner.store.snapshot());
        };
        inner.in_flight = None;

        match result {
            Ok(response) => {
                inner.store.append(Role::Assistant, response.text)?;
                inner.store.set_last_input(utterance);
                tracing::info!(
                    session_id = %self.id,
                    turns = inner.store.transcript().len(),
                    "Assistant turn recorded"
                );
                Ok(inner.store.snapshot())
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.id,
                    cause = %e.cause,
                    error = %e.message,
                    "Generation failed; user turn left unanswered"
                );
                Err(TurnError::GenerationFailed(e))
            }
        }
    }

    async fn generate(&self, history: &[LlmMessage]) -> Result<LlmResponse, GenerationError> {
        let call = self.generator.generate(history);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
                Err(GenerationError::timeout(format!(
                    "No response within {}ms",
                    limit.as_millis()
                )))
            }),
            None => call.await,
        }
    }
}
