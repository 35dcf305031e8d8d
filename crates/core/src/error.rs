use crate::SampleId;

/// Result alias that carries the custom [`QuizError`] type.
pub type Result<T> = std::result::Result<T, QuizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// The catalog (or the pool handed to question generation) holds no
    /// samples, so no question can be formed.
    #[error("not enough samples to build a question")]
    InsufficientSamples,
    /// A pool, question or answer referenced an id the catalog does not know.
    #[error("sample id {0} is not present in the catalog")]
    InvalidSampleId(SampleId),
    /// The answer being resolved was already removed from the pool.
    #[error("answer {0} is not part of the remaining pool")]
    AnswerNotInPool(SampleId),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for QuizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for QuizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
