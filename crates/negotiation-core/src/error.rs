use thiserror::Error;

#[derive(Error, Debug)]
pub enum NegotiationError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type NegotiationResult<T> = Result<T, NegotiationError>;
