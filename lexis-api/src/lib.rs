//! Public API for Lexis text annotation
//!
//! This crate provides a stable interface over the annotation pipeline that
//! hides engine types behind serializable DTOs.
//!
//! ```no_run
//! use lexis_api::{annotate, TaskSet};
//!
//! let tasks = TaskSet::parse_list("question,sentiment,date").unwrap();
//! let annotation = annotate("Can you send me the report by Friday?", &tasks)?;
//! println!("{}", annotation.to_json_pretty()?);
//! # Ok::<(), lexis_api::ApiError>(())
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod dto;
pub mod error;
pub mod input;

use error::Result;
use lexis_engine::{AnnotateRequest, AnnotatedDocument, Pipeline};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

// Re-export key types
pub use config::{Config, ConfigBuilder};
pub use dto::{
    DocumentAnnotation, EntityAnnotation, SentenceAnnotation, TaskAnnotation, TaskFailure,
    TokenAnnotation, WarningAnnotation,
};
pub use error::ApiError;
pub use input::Input;
pub use lexis_engine::{
    BuiltinModelLoader, CancellationToken, DateValue, DegradationKind, ExtractedTask, FeatureToken, FeatureView,
    LabelResult, ModelError, ModelHandle, ModelLoader, ResolvedDate, SentenceLabel, TaskCategory,
    TaskKind, TaskResult, TaskSet,
};

/// Main entry point for annotation
///
/// Owns the pipeline and, on first blocking call, a tokio runtime. Async
/// callers use [`annotate_async`](Self::annotate_async) on their own runtime.
pub struct Analyzer {
    pipeline: Arc<Pipeline>,
    config: Config,
    runtime: OnceLock<Runtime>,
}

impl Analyzer {
    /// Create an analyzer with default configuration and built-in models
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create an analyzer with custom configuration and built-in models
    pub fn with_config(config: Config) -> Result<Self> {
        Self::with_loader(config, &BuiltinModelLoader::new())
    }

    /// Create an analyzer whose models come from `loader`
    pub fn with_loader(config: Config, loader: &dyn ModelLoader) -> Result<Self> {
        let mut pipeline = Pipeline::with_loader(config.engine().clone(), loader)?;

        if !config.abbreviations().is_empty() {
            let tables = lexis_core::language::try_english()
                .map_err(|e| ApiError::Config(e.to_string()))?;
            let tables = (*tables)
                .clone()
                .with_extra_abbreviations(config.abbreviations());
            pipeline = pipeline.with_tables(Arc::new(tables));
        }

        log::debug!(
            "analyzer ready with {} classifier(s)",
            pipeline.registry().len()
        );
        Ok(Self {
            pipeline: Arc::new(pipeline),
            config,
            runtime: OnceLock::new(),
        })
    }

    /// Annotate with the configured default tasks
    ///
    /// Blocks the calling thread; must not be called from inside a tokio
    /// runtime.
    pub fn annotate(&self, input: impl Into<Input>) -> Result<DocumentAnnotation> {
        self.annotate_tasks(input, self.config.tasks())
    }

    /// Annotate with an explicit task set
    pub fn annotate_tasks(
        &self,
        input: impl Into<Input>,
        tasks: &TaskSet,
    ) -> Result<DocumentAnnotation> {
        let request = self.request(input.into(), tasks)?;
        let doc = self.runtime()?.block_on(self.pipeline.annotate(request))?;
        Ok(self.convert(&doc))
    }

    /// Annotate on the caller's runtime
    pub async fn annotate_async(
        &self,
        input: Input,
        tasks: &TaskSet,
    ) -> Result<DocumentAnnotation> {
        let request = self.request(input, tasks)?;
        let doc = self.pipeline.annotate(request).await?;
        Ok(self.convert(&doc))
    }

    /// Annotate on the caller's runtime, stopping when `cancel` fires
    pub async fn annotate_cancellable(
        &self,
        input: Input,
        tasks: &TaskSet,
        cancel: CancellationToken,
    ) -> Result<DocumentAnnotation> {
        let request = self.request(input, tasks)?.cancel_token(cancel);
        let doc = self.pipeline.annotate(request).await?;
        Ok(self.convert(&doc))
    }

    /// Get the current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The underlying pipeline
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    fn request(&self, input: Input, tasks: &TaskSet) -> Result<AnnotateRequest> {
        let request = match input {
            Input::Sentences(sentences) => AnnotateRequest::from_sentences(sentences),
            other => AnnotateRequest::new(other.read_text()?),
        };
        let mut request = request.tasks(tasks.clone());
        if let Some(date) = self.config.reference_date() {
            request = request.reference_date(date);
        }
        Ok(request)
    }

    fn convert(&self, doc: &AnnotatedDocument) -> DocumentAnnotation {
        DocumentAnnotation::from_document(doc, self.config.engine().benchmark)
    }

    fn runtime(&self) -> Result<&Runtime> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_time().thread_name("lexis-worker");
        if let Some(threads) = self.config.threads() {
            builder.worker_threads(threads);
        }
        let runtime = builder.build()?;
        Ok(self.runtime.get_or_init(|| runtime))
    }
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("config", &self.config)
            .field("runtime_started", &self.runtime.get().is_some())
            .finish()
    }
}

// Convenience functions

/// Annotate text with default configuration
pub fn annotate(text: &str, tasks: &TaskSet) -> Result<DocumentAnnotation> {
    Analyzer::new()?.annotate_tasks(text, tasks)
}

/// Annotate a file with default configuration
pub fn annotate_file<P: AsRef<std::path::Path>>(
    path: P,
    tasks: &TaskSet,
) -> Result<DocumentAnnotation> {
    Analyzer::new()?.annotate_tasks(Input::from_file(path.as_ref()), tasks)
}
