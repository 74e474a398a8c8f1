//! API error types

use lexis_engine::PipelineError;
use thiserror::Error;

/// API-level errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Input is not valid UTF-8 or is too large
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The request was cancelled
    #[error("annotation cancelled")]
    Cancelled,

    /// Engine error
    #[error("engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ApiError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedInput(_) => "malformed_input",
            ApiError::Cancelled => "cancelled",
            ApiError::Engine(_) => "engine",
            ApiError::Io(_) => "io",
            ApiError::Config(_) => "config",
            #[cfg(feature = "serde")]
            ApiError::Serde(_) => "serialization",
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        match error {
            PipelineError::MalformedInput { reason } => ApiError::MalformedInput(reason),
            PipelineError::Cancelled => ApiError::Cancelled,
            PipelineError::Config(message) => ApiError::Config(message),
            other => ApiError::Engine(other.to_string()),
        }
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
