//! Pipeline orchestration
//!
//! One [`AnnotateRequest`] produces one [`Document`] that moves through
//! `Created → Tokenized → Sentenced → Tagged → EntitiesResolved →
//! Classified → Finalized`. The linguistic stages run on a blocking
//! worker, classification fans out through the [`Dispatcher`], and task
//! failures stay inside the document.

use crate::cache::AnalysisCache;
use crate::classify::{ClassifierRegistry, ModelLoader, TaskSet};
use crate::config::EngineConfig;
use crate::dispatch::Dispatcher;
use crate::document::{AnnotatedDocument, Document};
use crate::error::{PipelineError, Result, Stage};
use crate::features::FeatureAssembler;
use crate::stages::LinguisticStages;
use chrono::NaiveDate;
use lexis_core::{LanguageTables, Span};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Input of a single annotation
#[derive(Debug, Clone)]
pub struct AnnotateRequest {
    text: Arc<str>,
    segments: Option<Vec<Span>>,
    tasks: TaskSet,
    reference_date: Option<NaiveDate>,
    entities: Option<bool>,
    cancel: Option<CancellationToken>,
}

impl AnnotateRequest {
    /// Request for `text` with no classification tasks
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            text: text.into(),
            segments: None,
            tasks: TaskSet::empty(),
            reference_date: None,
            entities: None,
            cancel: None,
        }
    }

    /// Request for raw bytes, which must be UTF-8
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|e| PipelineError::MalformedInput {
            reason: format!("input is not valid UTF-8: {e}"),
        })?;
        Ok(Self::new(text))
    }

    /// Request for sentences the caller already split
    ///
    /// The sentences are joined with newlines and each non-empty one becomes
    /// exactly one sentence of the document. Such requests bypass the
    /// analysis cache.
    pub fn from_sentences<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut segments = Vec::new();
        for sentence in sentences {
            let sentence = sentence.as_ref();
            if sentence.trim().is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            let start = text.len();
            text.push_str(sentence);
            segments.push(Span { start, end: text.len() });
        }
        let mut request = Self::new(text);
        request.segments = Some(segments);
        request
    }

    /// Classification tasks to run
    pub fn tasks(mut self, tasks: TaskSet) -> Self {
        self.tasks = tasks;
        self
    }

    /// Date that relative expressions resolve against (default: today)
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Override the configured entity stage setting for this request
    pub fn entities(mut self, enabled: bool) -> Self {
        self.entities = Some(enabled);
        self
    }

    /// Token that cancels this request
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Text to annotate
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Requested tasks
    pub fn requested_tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Caller-provided sentence spans, for requests built from sentences
    pub fn segments(&self) -> Option<&[Span]> {
        self.segments.as_deref()
    }
}

/// Annotation pipeline, built once and shared between requests
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EngineConfig,
    stages: Arc<LinguisticStages>,
    assembler: FeatureAssembler,
    dispatcher: Dispatcher,
    cache: Option<AnalysisCache>,
}

impl Pipeline {
    /// Pipeline over an explicit registry
    pub fn new(config: EngineConfig, registry: ClassifierRegistry) -> Result<Self> {
        config.validate()?;
        let stages = LinguisticStages::new(language_tables()?, config.parallel_threshold);
        Ok(Self {
            stages: Arc::new(stages),
            assembler: FeatureAssembler::new(),
            dispatcher: Dispatcher::new(Arc::new(registry)),
            cache: AnalysisCache::new(config.cache_capacity),
            config,
        })
    }

    /// Pipeline with the built-in models for every task
    pub fn builtin(config: EngineConfig) -> Result<Self> {
        let registry = ClassifierRegistry::builtin(&config);
        Self::new(config, registry)
    }

    /// Pipeline whose models come from `loader`
    pub fn with_loader(config: EngineConfig, loader: &dyn ModelLoader) -> Result<Self> {
        let registry = ClassifierRegistry::from_loader(loader, &config);
        Self::new(config, registry)
    }

    /// Replace the language tables used by the linguistic stages
    pub fn with_tables(mut self, tables: Arc<LanguageTables>) -> Self {
        self.stages = Arc::new(LinguisticStages::new(tables, self.config.parallel_threshold));
        self.cache = AnalysisCache::new(self.config.cache_capacity);
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered classifiers
    pub fn registry(&self) -> &ClassifierRegistry {
        self.dispatcher.registry()
    }

    /// Annotate one document
    ///
    /// Fails only on malformed input, a stage ordering defect or
    /// cancellation; classifier failures are recorded per task.
    pub async fn annotate(&self, request: AnnotateRequest) -> Result<AnnotatedDocument> {
        let AnnotateRequest {
            text,
            segments,
            tasks,
            reference_date,
            entities,
            cancel,
        } = request;

        if text.len() > self.config.max_input_bytes {
            return Err(PipelineError::MalformedInput {
                reason: format!(
                    "input is {} bytes, the limit is {}",
                    text.len(),
                    self.config.max_input_bytes
                ),
            });
        }

        let reference_date = reference_date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let entities = entities.unwrap_or(self.config.entities);
        let cancel = cancel.unwrap_or_default();
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let mut doc = self
            .linguistic(text, segments, reference_date, entities, &cancel)
            .await?;

        let view = Arc::new(self.assembler.assemble(&doc)?);
        let started = Instant::now();
        let outcomes = self.dispatcher.dispatch(view, &tasks, &cancel).await?;
        doc.record_timing(Stage::Classify, started.elapsed());
        doc.record_tasks(outcomes)?;

        let annotated = doc.finalize()?;
        log::debug!(
            "annotated {} tokens, {} sentences, {} task(s)",
            annotated.tokens().len(),
            annotated.sentences().len(),
            annotated.tasks().len()
        );
        Ok(annotated)
    }

    /// Run the linguistic stages, from the cache when possible
    async fn linguistic(
        &self,
        text: Arc<str>,
        segments: Option<Vec<Span>>,
        reference_date: NaiveDate,
        entities: bool,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        // Cached analyses were split by the splitter, not by the caller
        let cache = self.cache.as_ref().filter(|_| segments.is_none());

        let lookup = Instant::now();
        if let Some(mut doc) = cache.and_then(|cache| cache.get(&text, entities, reference_date)) {
            log::debug!("linguistic analysis served from cache");
            doc.record_timing(Stage::CacheLookup, lookup.elapsed());
            return Ok(doc);
        }

        let stages = Arc::clone(&self.stages);
        let work = tokio::task::spawn_blocking(move || match segments {
            Some(segments) => stages.analyze_segments(text, &segments, reference_date, entities),
            None => stages.analyze(text, reference_date, entities),
        });
        let doc = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            joined = work => joined.map_err(|e| PipelineError::Worker(e.to_string()))??,
        };

        if let Some(cache) = cache {
            cache.insert(&doc, entities);
        }
        Ok(doc)
    }
}

fn language_tables() -> Result<Arc<LanguageTables>> {
    lexis_core::language::try_english().map_err(|e| PipelineError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TaskKind;
    use crate::document::PipelineState;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[tokio::test]
    async fn test_annotate_reaches_finalized() {
        let pipeline = Pipeline::builtin(EngineConfig::default()).unwrap();
        let request = AnnotateRequest::new("Can you send me the report by Friday?")
            .tasks(TaskSet::from([TaskKind::Question]))
            .reference_date(date());
        let doc = pipeline.annotate(request).await.unwrap();

        assert_eq!(doc.state(), &PipelineState::Finalized);
        assert_eq!(doc.tasks().len(), 1);
        assert!(doc.task(TaskKind::Question).unwrap().is_ok());
        assert!(doc.task(TaskKind::Date).is_none());
    }

    #[tokio::test]
    async fn test_oversized_input_is_malformed() {
        let config = EngineConfig {
            max_input_bytes: 8,
            ..EngineConfig::default()
        };
        let pipeline = Pipeline::builtin(config).unwrap();
        let err = pipeline
            .annotate(AnnotateRequest::new("This is far too long."))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let err = AnnotateRequest::from_bytes(&[0x66, 0x6f, 0xff]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));
    }

    #[tokio::test]
    async fn test_cached_analysis_is_reused() {
        let config = EngineConfig {
            cache_capacity: 8,
            ..EngineConfig::default()
        };
        let pipeline = Pipeline::builtin(config).unwrap();
        let ask = |day: u32| {
            AnnotateRequest::new("See you Friday.")
                .tasks(TaskSet::from([TaskKind::Date]))
                .reference_date(NaiveDate::from_ymd_opt(2024, 3, day).unwrap())
        };

        let first = pipeline.annotate(ask(4)).await.unwrap();
        let second = pipeline.annotate(ask(11)).await.unwrap();
        assert_eq!(first.tokens(), second.tokens());

        let resolved = |doc: &AnnotatedDocument| {
            let outcome = doc.task(TaskKind::Date).unwrap().as_ref().unwrap();
            outcome.as_dates().unwrap()[0].resolved
        };
        assert_ne!(resolved(&first), resolved(&second));

        let stages = |doc: &AnnotatedDocument| -> Vec<Stage> {
            doc.timings().iter().map(|t| t.stage).collect()
        };
        assert!(stages(&first).contains(&Stage::Tokenize));
        assert!(!stages(&second).contains(&Stage::Tokenize));
        assert_eq!(stages(&second), [Stage::CacheLookup, Stage::Classify]);
    }

    #[tokio::test]
    async fn test_pre_split_sentences_are_kept_and_never_cached() {
        let config = EngineConfig {
            cache_capacity: 8,
            ..EngineConfig::default()
        };
        let pipeline = Pipeline::builtin(config).unwrap();
        let ask = || {
            AnnotateRequest::from_sentences(["see you at 5", "  ", "Dr. Who said hi. Then left"])
                .reference_date(date())
        };
        assert_eq!(ask().segments().map(<[Span]>::len), Some(2));

        let first = pipeline.annotate(ask()).await.unwrap();
        let second = pipeline.annotate(ask()).await.unwrap();
        assert_eq!(first.text(), "see you at 5\nDr. Who said hi. Then left");
        let sentences: Vec<&str> = first
            .sentences()
            .iter()
            .map(|s| &first.text()[s.span.start..s.span.end])
            .collect();
        assert_eq!(sentences, ["see you at 5", "Dr. Who said hi. Then left"]);
        assert!(second.timings().iter().any(|t| t.stage == Stage::Tokenize));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let pipeline = Pipeline::builtin(EngineConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = pipeline
            .annotate(AnnotateRequest::new("Hello.").cancel_token(cancel))
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::Cancelled);
    }
}
