//! Layered error types
//!
//! Pipeline-fatal errors (`PipelineError`) abort the document. Task errors
//! (`TaskError`) are recorded per task inside an otherwise successful
//! result, and degradations (`StageDegraded`) are warnings only.

use crate::classify::TaskKind;
use lexis_core::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Text to tokens
    Tokenize,
    /// Language identification over the tokens
    IdentifyLanguage,
    /// Tokens to sentences
    SentenceSplit,
    /// POS tagging
    Tag,
    /// Dictionary forms of tagged tokens
    Lemmatize,
    /// Named entity recognition
    EntityRecognize,
    /// Linguistic analysis served from the cache
    CacheLookup,
    /// Classification fan-out
    Classify,
    /// Freezing the document
    Finalize,
}

impl Stage {
    /// Stage name used in logs and statistics
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Tokenize => "tokenize",
            Stage::IdentifyLanguage => "identify_language",
            Stage::SentenceSplit => "sentence_split",
            Stage::Tag => "tag",
            Stage::Lemmatize => "lemmatize",
            Stage::EntityRecognize => "entity_recognize",
            Stage::CacheLookup => "cache_lookup",
            Stage::Classify => "classify",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort the whole document
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Input is not valid UTF-8 or exceeds the size limit
    #[error("malformed input: {reason}")]
    MalformedInput {
        /// What is wrong with the input
        reason: String,
    },

    /// A stage ran before the stages it depends on (a defect, not user error)
    #[error("incomplete document: cannot run {stage} in state {state}")]
    IncompleteDocument {
        /// Stage that was attempted
        stage: Stage,
        /// State the document was in
        state: String,
    },

    /// A linguistic stage failed
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Failing stage
        stage: Stage,
        /// Underlying core error
        #[source]
        source: CoreError,
    },

    /// The request was cancelled before completion
    #[error("annotation cancelled")]
    Cancelled,

    /// A worker thread panicked or was shut down
    #[error("worker failed: {0}")]
    Worker(String),

    /// Invalid engine configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedInput { .. } => "malformed_input",
            PipelineError::IncompleteDocument { .. } => "incomplete_document",
            PipelineError::Stage { .. } => "stage_failed",
            PipelineError::Cancelled => "cancelled",
            PipelineError::Worker(_) => "worker_failed",
            PipelineError::Config(_) => "config",
        }
    }
}

/// Why an inference call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceFailure {
    /// The adapter exceeded its timeout
    Timeout,
    /// The model failed, panicked, or returned an invalid result
    Internal,
}

impl fmt::Display for InferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceFailure::Timeout => f.write_str("timeout"),
            InferenceFailure::Internal => f.write_str("internal"),
        }
    }
}

/// Failure of a single classification task
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum TaskError {
    /// No model is loaded for the task
    #[error("model unavailable for {task}: {reason}")]
    ModelUnavailable {
        /// Affected task
        task: TaskKind,
        /// Why the model is missing
        reason: String,
    },

    /// The model was invoked but did not produce a usable result
    #[error("{kind} inference error: {message}")]
    InferenceError {
        /// Timeout or internal failure
        kind: InferenceFailure,
        /// Detail message
        message: String,
    },
}

impl TaskError {
    /// Timeout error for an adapter limited to `limit`
    pub fn timeout(task: TaskKind, limit: std::time::Duration) -> Self {
        TaskError::InferenceError {
            kind: InferenceFailure::Timeout,
            message: format!("{task} did not finish within {} ms", limit.as_millis()),
        }
    }

    /// Internal inference failure
    pub fn internal(message: impl Into<String>) -> Self {
        TaskError::InferenceError {
            kind: InferenceFailure::Internal,
            message: message.into(),
        }
    }

    /// Short machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::ModelUnavailable { .. } => "model_unavailable",
            TaskError::InferenceError {
                kind: InferenceFailure::Timeout,
                ..
            } => "timeout",
            TaskError::InferenceError {
                kind: InferenceFailure::Internal,
                ..
            } => "internal",
        }
    }
}

/// Errors from model loading and raw inference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The loader does not know the model id
    #[error("unknown model id '{0}'")]
    UnknownModel(String),

    /// The model exists but serves another task
    #[error("model '{model}' does not serve task {task}")]
    TaskMismatch {
        /// Requested model id
        model: String,
        /// Task it was requested for
        task: TaskKind,
    },

    /// Loading failed
    #[error("failed to load model: {0}")]
    Load(String),

    /// Inference failed inside the model
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Reason a linguistic stage degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationKind {
    /// The text contains no tokens
    EmptyInput,
    /// Many tokens were tagged by the no-evidence fallback
    HighUnknownRatio,
    /// Multi-word text without sentence-final punctuation
    NoTerminalPunctuation,
    /// Entity recognition was disabled for this request
    EntitiesSkipped,
    /// The text has words but no language could be identified
    UndeterminedLanguage,
}

impl DegradationKind {
    /// Machine-readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationKind::EmptyInput => "empty_input",
            DegradationKind::HighUnknownRatio => "high_unknown_ratio",
            DegradationKind::NoTerminalPunctuation => "no_terminal_punctuation",
            DegradationKind::EntitiesSkipped => "entities_skipped",
            DegradationKind::UndeterminedLanguage => "undetermined_language",
        }
    }
}

/// Non-fatal warning attached to the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDegraded {
    /// Stage that degraded
    pub stage: Stage,
    /// Kind of degradation
    pub kind: DegradationKind,
    /// Human-readable detail
    pub message: String,
}

impl StageDegraded {
    /// Create a warning
    pub fn new(stage: Stage, kind: DegradationKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Outcome of one task
pub type TaskOutcome = std::result::Result<crate::classify::TaskResult, TaskError>;
