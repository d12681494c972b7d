use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// Nothing to learn from at all.
    #[error("no purchase history found")]
    NoData,

    #[error("insufficient data: {required} purchase(s) required, {available} available")]
    InsufficientData { required: usize, available: usize },

    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

impl AiError {
    /// `true` for the "not enough history" outcomes, which callers treat as a
    /// normal skipped run rather than a failure.
    pub fn is_data_sufficiency(&self) -> bool {
        matches!(self, AiError::NoData | AiError::InsufficientData { .. })
    }
}
