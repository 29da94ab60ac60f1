//! Session registry
//!
//! Each session owns one [`TurnEngine`]; nothing but the generator is shared
//! between sessions. Sessions nobody has touched for the idle TTL are
//! dropped, since clients rarely say goodbye.

use crate::conversation::TurnEngine;
use crate::llm::ResponseGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

pub type SharedGenerator = Arc<dyn ResponseGenerator>;
pub type SessionEngine = TurnEngine<SharedGenerator>;

struct SessionEntry {
    engine: SessionEngine,
    last_access: Instant,
}

impl SessionEntry {
    fn is_idle(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.last_access) >= ttl)
    }
}

/// Manager for all live sessions
pub struct SessionManager {
    generator: SharedGenerator,
    timeout: Option<Duration>,
    idle_ttl: Option<Duration>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionManager {
    pub fn new(generator: SharedGenerator, timeout: Option<Duration>) -> Self {
        Self {
            generator,
            timeout,
            idle_ttl: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Expire sessions that go `ttl` without a lookup
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_ttl = ttl;
        self
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    /// Start a new, empty session
    pub async fn start(&self) -> SessionEngine {
        let id = uuid::Uuid::new_v4().to_string();
        let generator = Arc::clone(&self.generator);
        let engine = TurnEngine::with_optional_timeout(id.clone(), generator, self.timeout);

        let entry = SessionEntry {
            engine: engine.clone(),
            last_access: Instant::now(),
        };
        self.sessions.write().await.insert(id.clone(), entry);
        tracing::info!(session_id = %id, "Session started");
        engine
    }

    /// Look up a session and mark it as used. Idle sessions count as gone.
    pub async fn get(&self, id: &str) -> Option<SessionEngine> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if entry.is_idle(self.idle_ttl, now) {
            return None;
        }
        entry.last_access = now;
        Some(entry.engine.clone())
    }

    /// End a session, discarding its transcript. Returns false if it was unknown.
    pub async fn end(&self, id: &str) -> bool {
        let Some(entry) = self.sessions.write().await.remove(id) else {
            return false;
        };
        entry.engine.clear().await;
        tracing::info!(session_id = %id, "Session ended");
        true
    }

    /// Drop every session idle for longer than the TTL. Returns how many went.
    pub async fn prune_idle(&self) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();
        self.sessions.write().await.retain(|_, entry| {
            let idle = entry.is_idle(self.idle_ttl, now);
            if idle {
                expired.push(entry.engine.clone());
            }
            !idle
        });

        for engine in &expired {
            engine.clear().await;
            tracing::info!(session_id = %engine.id(), "Idle session expired");
        }
        expired.len()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
