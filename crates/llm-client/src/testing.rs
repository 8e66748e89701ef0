//! Scripted providers for tests. Enabled with the `test-support` feature.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{LlmError, LlmResult};
use crate::provider::LlmProvider;

/// Returns the same JSON value on every call and counts calls.
pub struct ScriptedProvider {
    response: serde_json::Value,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(response: serde_json::Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate_response(&self, prompt: &str) -> LlmResult<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.response.clone())
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Fails every call and counts calls.
#[derive(Default)]
pub struct FailingProvider {
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn generate_response(&self, _prompt: &str) -> LlmResult<serde_json::Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::ServiceUnavailable("scripted failure".into()))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}
