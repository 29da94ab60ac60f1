//! Runtime configuration, read once from the environment

use crate::llm::GroqConfig;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub groq: Option<GroqConfig>,
    /// Per-turn generation timeout enforced by the engine
    pub generation_timeout: Option<Duration>,
    /// Sessions untouched for this long are dropped; `None` keeps them forever
    pub session_ttl: Option<Duration>,
}

const DEFAULT_SESSION_TTL_SECS: u64 = 3600;

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PARLEY_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let groq = var("GROQ_API_KEY")
            .or_else(|| var("groq_api_key"))
            .map(|api_key| {
                let mut groq = GroqConfig::new(api_key);
                if let Some(model) = var("PARLEY_MODEL") {
                    groq.model = model;
                }
                if let Some(base_url) = var("GROQ_BASE_URL") {
                    groq.base_url = base_url;
                }
                groq.system_prompt = var("PARLEY_SYSTEM_PROMPT");
                groq.max_tokens = var("PARLEY_MAX_TOKENS").and_then(|t| t.parse().ok());
                groq
            });

        let generation_timeout = var("PARLEY_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let session_ttl_secs = var("PARLEY_SESSION_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);
        let session_ttl = (session_ttl_secs > 0).then_some(Duration::from_secs(session_ttl_secs));

        Self {
            port,
            groq,
            generation_timeout,
            session_ttl,
        }
    }
}
