//! parley - turn-taking chat service
//!
//! Keeps an in-memory transcript per session and asks a hosted model for
//! exactly one reply per user turn.

mod api;
mod config;
mod conversation;
mod llm;
mod session;

use api::{create_router, AppState};
use config::Config;
use llm::{GroqGenerator, LoggingGenerator, ResponseGenerator};
use session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env();
    let Some(groq_config) = config.groq else {
        tracing::error!("No API key configured. Set GROQ_API_KEY.");
        return Err("GROQ_API_KEY is not set".into());
    };

    // Initialize generator
    let groq: Arc<dyn ResponseGenerator> = Arc::new(GroqGenerator::new(groq_config)?);
    let generator: Arc<dyn ResponseGenerator> = Arc::new(LoggingGenerator::new(groq));
    let model_id = generator.model_id().to_string();
    tracing::info!(
        model = %model_id,
        timeout_secs = ?config.generation_timeout.map(|t| t.as_secs()),
        "Response generator initialized"
    );

    // Create application state
    let sessions = SessionManager::new(generator, config.generation_timeout)
        .with_idle_ttl(config.session_ttl);
    let state = AppState::new(sessions, model_id);

    // Expire abandoned sessions
    if let Some(ttl) = state.sessions.idle_ttl() {
        let sessions = Arc::clone(&state.sessions);
        let period = ttl.min(Duration::from_secs(60));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let expired = sessions.prune_idle().await;
                if expired > 0 {
                    tracing::info!(expired, "Pruned idle sessions");
                }
            }
        });
        tracing::info!(ttl_secs = ttl.as_secs(), "Idle session expiry enabled");
    }

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("parley listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
