//! Core error types (deterministic only)

use thiserror::Error;

/// Core linguistic errors (no I/O, no model failures)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Span with `start >= end`
    #[error("invalid span {start}..{end}")]
    InvalidSpan {
        /// Start byte offset
        start: usize,
        /// End byte offset
        end: usize,
    },

    /// Offset that does not fall on a UTF-8 character boundary
    #[error("offset {offset} is not on a UTF-8 character boundary")]
    InvalidUtf8Boundary {
        /// The offending byte offset
        offset: usize,
    },

    /// Token indices that do not belong to the sentence being processed
    #[error("token range {start}..{end} is outside the {len} available tokens")]
    TokenRangeOutOfBounds {
        /// First token index
        start: usize,
        /// One past the last token index
        end: usize,
        /// Number of tokens available
        len: usize,
    },

    /// Language table could not be parsed or validated
    #[error("language configuration error: {0}")]
    LanguageConfig(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
