use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::provider::{extract_json_object, LlmProvider};
use crate::prompts::SYSTEM_PROMPT;
use crate::LlmConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Claude Messages API client returning the JSON object embedded in the reply
#[derive(Clone)]
pub struct ClaudeClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ClaudeClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client, config }
    }

    pub fn with_defaults() -> Self {
        Self::new(LlmConfig::default())
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let api_key = self.config.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::RequestFailed(e) })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ServiceUnavailable(format!("Status: {} {}", status, body)));
        }

        let parsed = response.json::<MessagesResponse>().await?;
        if parsed.stop_reason.as_deref() == Some("max_tokens") {
            tracing::warn!("Claude response truncated at max_tokens={}", self.config.max_tokens);
        }

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    async fn generate_response(&self, prompt: &str) -> LlmResult<serde_json::Value> {
        let text = self.complete(prompt).await?;
        let value = extract_json_object(&text)?;
        tracing::debug!("Claude ({}) returned {} top-level keys", self.config.model,
            value.as_object().map(|o| o.len()).unwrap_or(0));
        Ok(value)
    }

    fn backend_name(&self) -> &'static str {
        "claude"
    }
}
