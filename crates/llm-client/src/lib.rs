pub mod claude;
pub mod contracts;
pub mod error;
pub mod prompts;
pub mod provider;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use claude::ClaudeClient;
pub use contracts::{
    ConversationInsights, CounterOfferDraft, PsychologyInsights, StrategicSummary,
    StrategyTalkingPoints,
};
pub use error::{LlmError, LlmResult};
pub use provider::{extract_json_object, request_structured, DisabledProvider, LlmProvider};

use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Configuration for the Claude client
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: std::env::var("CLAUDE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens: std::env::var("CLAUDE_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2048),
            timeout: Duration::from_secs(
                std::env::var("LLM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// Build the provider for a config: the Claude client when a key is present,
/// otherwise a disabled provider so every engine runs on its fallbacks.
pub fn provider_from_config(config: LlmConfig) -> Arc<dyn LlmProvider> {
    if config.api_key.is_some() {
        Arc::new(ClaudeClient::new(config))
    } else {
        tracing::warn!("ANTHROPIC_API_KEY not set; LLM-backed insights will use fallbacks");
        Arc::new(DisabledProvider)
    }
}
