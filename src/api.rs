//! HTTP API
//!
//! The presentation boundary: clients pull snapshots and push user actions.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::session::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub model_id: String,
}

impl AppState {
    pub fn new(sessions: SessionManager, model_id: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(sessions),
            model_id: model_id.into(),
        }
    }
}
