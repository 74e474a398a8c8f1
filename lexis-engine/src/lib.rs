//! Annotation pipeline for Lexis
//!
//! This crate turns the linguistic core into a per-document pipeline: the
//! [`Document`] aggregate and its stage state machine, the
//! [`FeatureAssembler`], the classification registry with its model
//! contract and built-in reference models, the concurrent [`Dispatcher`]
//! and the [`Pipeline`] orchestrator.
//!
//! ```no_run
//! use lexis_engine::{AnnotateRequest, EngineConfig, Pipeline, TaskSet};
//!
//! # async fn run() -> lexis_engine::Result<()> {
//! let pipeline = Pipeline::builtin(EngineConfig::default())?;
//! let tasks = TaskSet::parse_list("question,sentiment,date").unwrap();
//! let doc = pipeline
//!     .annotate(AnnotateRequest::new("Can you send me the report by Friday?").tasks(tasks))
//!     .await?;
//! assert_eq!(doc.sentences().len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod stages;

// Re-export key types
pub use cache::AnalysisCache;
pub use classify::{
    BuiltinModelLoader, Classifier, ClassifierRegistry, DateValue, ExtractedTask, LabelResult,
    ModelAdapter, ModelHandle, ModelLoader, ResolvedDate, SentenceLabel, TaskCategory, TaskKind,
    TaskResult, TaskSet, UnknownTaskError,
};
pub use config::EngineConfig;
pub use dispatch::Dispatcher;
pub use document::{AnnotatedDocument, Document, PipelineState, StageTiming};
pub use error::{
    DegradationKind, InferenceFailure, ModelError, PipelineError, Result, Stage, StageDegraded,
    TaskError, TaskOutcome,
};
pub use features::{EntityMark, FeatureAssembler, FeatureToken, FeatureView};
pub use pipeline::{AnnotateRequest, Pipeline};
pub use stages::LinguisticStages;

// Re-export from core for convenience
pub use lexis_core::{
    Entity, EntityType, LanguageGuess, LanguageTables, PosTag, Sentence, Span, Token, TokenKind,
};
pub use tokio_util::sync::CancellationToken;
