use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{LlmError, LlmResult};

/// Backend-agnostic interface for LLM calls.
///
/// A provider takes a fully built prompt and returns the JSON object the
/// model produced. Engines never index into the raw value; they go through
/// [`request_structured`] to get a typed contract.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_response(&self, prompt: &str) -> LlmResult<serde_json::Value>;

    fn backend_name(&self) -> &'static str;
}

/// Provider used when no API key is configured. Every call fails with
/// `MissingApiKey` so callers take their documented fallbacks.
pub struct DisabledProvider;

#[async_trait]
impl LlmProvider for DisabledProvider {
    async fn generate_response(&self, _prompt: &str) -> LlmResult<serde_json::Value> {
        Err(LlmError::MissingApiKey)
    }

    fn backend_name(&self) -> &'static str {
        "disabled"
    }
}

/// Call the provider and validate the reply against a typed contract.
pub async fn request_structured<T: DeserializeOwned>(
    provider: &dyn LlmProvider,
    prompt: &str,
) -> LlmResult<T> {
    let value = provider.generate_response(prompt).await?;
    if !value.is_object() {
        return Err(LlmError::InvalidResponse(format!(
            "expected JSON object from {}, got {}",
            provider.backend_name(),
            value
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// Pull the outermost `{...}` block out of free text and parse it.
pub fn extract_json_object(text: &str) -> LlmResult<serde_json::Value> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            let value: serde_json::Value = serde_json::from_str(&text[start..=end])?;
            Ok(value)
        }
        _ => Err(LlmError::InvalidResponse(
            "no JSON object found in model output".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::PsychologyInsights;
    use crate::testing::ScriptedProvider;
    use serde_json::json;

    #[test]
    fn test_extract_json_object_from_prose() {
        let text = "Here is the analysis:\n{\"urgency\": 70, \"notes\": [\"a\"]}\nThanks";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["urgency"], 70);
    }

    #[test]
    fn test_extract_json_object_missing() {
        assert!(matches!(
            extract_json_object("no json here"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_request_structured_fills_defaults() {
        let provider = ScriptedProvider::new(json!({"hot_buttons": ["closing date"]}));
        let insights: PsychologyInsights = request_structured(&provider, "prompt").await.unwrap();
        assert_eq!(insights.hot_buttons, vec!["closing date".to_string()]);
        assert_eq!(insights.emotional_intensity, 50.0);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_structured_rejects_non_object() {
        let provider = ScriptedProvider::new(json!(["not", "an", "object"]));
        let result: LlmResult<PsychologyInsights> = request_structured(&provider, "prompt").await;
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_disabled_provider_fails() {
        let result = DisabledProvider.generate_response("anything").await;
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
