use negotiation_core::NegotiationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("ANTHROPIC_API_KEY is not configured")]
    MissingApiKey,

    #[error("Timeout")]
    Timeout,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;

impl From<LlmError> for NegotiationError {
    fn from(err: LlmError) -> Self {
        NegotiationError::Llm(err.to_string())
    }
}
