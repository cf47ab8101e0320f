use thiserror::Error;

/// Unified error type for LLM operations
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    ///
    /// `detail` carries the upstream `error` object when the body was JSON,
    /// so callers can pass it through unchanged.
    #[error("api error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        detail: Option<serde_json::Value>,
    },

    #[error("transform error: {0}")]
    Transform(#[from] ConversionError),

    #[error("config error: {0}")]
    Config(String),
}

/// Error during schema transformation
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl From<LLMError> for gemchat_core::ServiceError {
    fn from(e: LLMError) -> Self {
        match e {
            LLMError::Network(msg) => Self::Network(msg),
            LLMError::Api {
                status, message, ..
            } => Self::Status { status, message },
            LLMError::Transform(e) => Self::Malformed(e.to_string()),
            LLMError::Config(msg) => Self::Network(format!("misconfigured client: {}", msg)),
        }
    }
}

pub type Result<T> = std::result::Result<T, LLMError>;
