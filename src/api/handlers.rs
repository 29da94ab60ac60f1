//! HTTP request handlers

use super::types::{EndSessionResponse, ErrorResponse, SessionView, SubmitRequest, VersionResponse};
use super::AppState;
use crate::conversation::TurnError;
use crate::llm::FailureCause;
use crate::session::SessionEngine;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:id", get(get_session).delete(end_session))
        // User actions
        .route("/api/sessions/:id/messages", post(submit_message))
        .route("/api/sessions/:id/retry", post(retry_last))
        .route("/api/sessions/:id/clear", post(clear_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn lookup(state: &AppState, id: &str) -> Result<SessionEngine, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn start_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let engine = state.sessions.start().await;
    (StatusCode::CREATED, Json(SessionView::of(&engine).await))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let engine = lookup(&state, &id).await?;
    Ok(Json(SessionView::of(&engine).await))
}

async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EndSessionResponse>, AppError> {
    if !state.sessions.end(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    Ok(Json(EndSessionResponse {
        success: true,
        farewell: "Goodbye!".to_string(),
    }))
}

// ============================================================
// User Actions
// ============================================================

async fn submit_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SessionView>, AppError> {
    let engine = lookup(&state, &id).await?;
    engine.submit(&req.text).await?;
    Ok(Json(SessionView::of(&engine).await))
}

async fn retry_last(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let engine = lookup(&state, &id).await?;
    engine.retry_last().await?;
    Ok(Json(SessionView::of(&engine).await))
}

async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let engine = lookup(&state, &id).await?;
    engine.clear().await;
    Ok(Json(SessionView::of(&engine).await))
}

async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: concat!("parley ", env!("CARGO_PKG_VERSION")).to_string(),
        model: state.model_id.clone(),
        active_sessions: state.sessions.count().await,
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Conflict(String),
    Generation { message: String, cause: FailureCause },
    Internal(String),
}

impl From<TurnError> for AppError {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::Busy | TurnError::PendingRetry => AppError::Conflict(err.to_string()),
            TurnError::GenerationFailed(e) => AppError::Generation {
                message: e.message,
                cause: e.cause,
            },
            TurnError::InvalidOrder(_) | TurnError::Interrupted(_) => {
                tracing::error!(error = %err, "Turn engine invariant violated");
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new(msg)),
            AppError::Generation { message, cause } => {
                let status = if cause == FailureCause::Timeout {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                (
                    status,
                    ErrorResponse {
                        error: message,
                        cause: Some(cause),
                    },
                )
            }
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}
