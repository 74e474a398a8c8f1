//! Document aggregate and stage state machine
//!
//! A [`Document`] collects the output of each stage exactly once, in order.
//! Recording a stage out of order is a defect and yields
//! [`PipelineError::IncompleteDocument`]. Finalizing freezes the document
//! into an [`AnnotatedDocument`] that exposes read-only views.

use crate::classify::TaskKind;
use crate::error::{PipelineError, Result, Stage, StageDegraded, TaskOutcome};
use chrono::NaiveDate;
use lexis_core::{Entity, LanguageGuess, PosTag, Sentence, SentenceTags, Token};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle state of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Raw text only
    Created,
    /// Tokens recorded
    Tokenized,
    /// Sentences recorded
    Sentenced,
    /// POS tags recorded
    Tagged,
    /// Entities recorded or skipped
    EntitiesResolved,
    /// Task outcomes recorded
    Classified,
    /// Frozen
    Finalized,
    /// A stage failed; no further stage may run
    Failed {
        /// Stage that failed
        stage: Stage,
        /// Error message
        cause: String,
    },
}

impl PipelineState {
    /// Position in the happy path (`Failed` has none)
    fn rank(&self) -> Option<u8> {
        Some(match self {
            PipelineState::Created => 0,
            PipelineState::Tokenized => 1,
            PipelineState::Sentenced => 2,
            PipelineState::Tagged => 3,
            PipelineState::EntitiesResolved => 4,
            PipelineState::Classified => 5,
            PipelineState::Finalized => 6,
            PipelineState::Failed { .. } => return None,
        })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Created => f.write_str("created"),
            PipelineState::Tokenized => f.write_str("tokenized"),
            PipelineState::Sentenced => f.write_str("sentenced"),
            PipelineState::Tagged => f.write_str("tagged"),
            PipelineState::EntitiesResolved => f.write_str("entities_resolved"),
            PipelineState::Classified => f.write_str("classified"),
            PipelineState::Finalized => f.write_str("finalized"),
            PipelineState::Failed { stage, cause } => write!(f, "failed at {stage}: {cause}"),
        }
    }
}

/// Wall-clock time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    /// Stage
    pub stage: Stage,
    /// Elapsed time
    pub elapsed: Duration,
}

/// Mutable per-request document, filled stage by stage
#[derive(Debug, Clone)]
pub struct Document {
    text: Arc<str>,
    reference_date: NaiveDate,
    state: PipelineState,
    tokens: Vec<Token>,
    language: Option<LanguageGuess>,
    tags: Vec<PosTag>,
    guessed_tags: usize,
    lemmas: Option<Vec<String>>,
    stopwords: Vec<bool>,
    sentences: Vec<Sentence>,
    entities: Vec<Entity>,
    entities_skipped: bool,
    tasks: BTreeMap<TaskKind, TaskOutcome>,
    warnings: Vec<StageDegraded>,
    timings: Vec<StageTiming>,
}

impl Document {
    /// New document for `text`, resolving relative dates against `reference_date`
    pub fn new(text: impl Into<Arc<str>>, reference_date: NaiveDate) -> Self {
        Self {
            text: text.into(),
            reference_date,
            state: PipelineState::Created,
            tokens: Vec::new(),
            language: None,
            tags: Vec::new(),
            guessed_tags: 0,
            lemmas: None,
            stopwords: Vec::new(),
            sentences: Vec::new(),
            entities: Vec::new(),
            entities_skipped: false,
            tasks: BTreeMap::new(),
            warnings: Vec::new(),
            timings: Vec::new(),
        }
    }

    /// Same linguistic analysis, different reference date
    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    /// Drop recorded timings, keeping the analysis
    pub fn clear_timings(&mut self) {
        self.timings.clear();
    }

    fn advance(&mut self, stage: Stage, from: PipelineState, to: PipelineState) -> Result<()> {
        if self.state != from {
            return Err(PipelineError::IncompleteDocument {
                stage,
                state: self.state.to_string(),
            });
        }
        log::debug!("document {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Record the tokenizer output
    pub fn record_tokens(&mut self, tokens: Vec<Token>) -> Result<()> {
        self.advance(Stage::Tokenize, PipelineState::Created, PipelineState::Tokenized)?;
        self.tokens = tokens;
        Ok(())
    }

    /// Record the identified language, once, before sentences are split
    pub fn record_language(&mut self, guess: LanguageGuess) -> Result<()> {
        if self.state != PipelineState::Tokenized || self.language.is_some() {
            return Err(PipelineError::IncompleteDocument {
                stage: Stage::IdentifyLanguage,
                state: self.state.to_string(),
            });
        }
        self.language = Some(guess);
        Ok(())
    }

    /// Record the sentence splitter output
    pub fn record_sentences(&mut self, sentences: Vec<Sentence>) -> Result<()> {
        self.advance(Stage::SentenceSplit, PipelineState::Tokenized, PipelineState::Sentenced)?;
        self.sentences = sentences;
        Ok(())
    }

    /// Record per-sentence tags, flattened into one tag per token
    pub fn record_tags(&mut self, sentence_tags: Vec<SentenceTags>) -> Result<()> {
        let total: usize = sentence_tags.iter().map(SentenceTags::len).sum();
        if self.state == PipelineState::Sentenced && total != self.tokens.len() {
            return Err(PipelineError::IncompleteDocument {
                stage: Stage::Tag,
                state: format!("{} ({} tags for {} tokens)", self.state, total, self.tokens.len()),
            });
        }
        self.advance(Stage::Tag, PipelineState::Sentenced, PipelineState::Tagged)?;
        self.guessed_tags = sentence_tags.iter().map(SentenceTags::guessed).sum();
        self.tags = sentence_tags
            .iter()
            .flat_map(|t| t.tags().iter().copied())
            .collect();
        Ok(())
    }

    /// Record one lemma and one stopword flag per token, once, after tagging
    pub fn record_lemmas(&mut self, lemmas: Vec<String>, stopwords: Vec<bool>) -> Result<()> {
        if self.state != PipelineState::Tagged
            || self.lemmas.is_some()
            || lemmas.len() != self.tokens.len()
            || stopwords.len() != self.tokens.len()
        {
            return Err(PipelineError::IncompleteDocument {
                stage: Stage::Lemmatize,
                state: format!(
                    "{} ({} lemmas for {} tokens)",
                    self.state,
                    lemmas.len(),
                    self.tokens.len()
                ),
            });
        }
        self.lemmas = Some(lemmas);
        self.stopwords = stopwords;
        Ok(())
    }

    /// Record entities, or `None` when the stage was skipped
    pub fn record_entities(&mut self, entities: Option<Vec<Entity>>) -> Result<()> {
        self.advance(
            Stage::EntityRecognize,
            PipelineState::Tagged,
            PipelineState::EntitiesResolved,
        )?;
        self.entities_skipped = entities.is_none();
        self.entities = entities.unwrap_or_default();
        Ok(())
    }

    /// Record the outcome of every requested task
    pub fn record_tasks(&mut self, tasks: BTreeMap<TaskKind, TaskOutcome>) -> Result<()> {
        self.advance(
            Stage::Classify,
            PipelineState::EntitiesResolved,
            PipelineState::Classified,
        )?;
        self.tasks = tasks;
        Ok(())
    }

    /// Mark the document failed; later stages will be rejected
    pub fn fail(&mut self, stage: Stage, cause: impl Into<String>) {
        let cause = cause.into();
        log::debug!("document failed at {stage}: {cause}");
        self.state = PipelineState::Failed { stage, cause };
    }

    /// Attach a degradation warning
    pub fn warn(&mut self, warning: StageDegraded) {
        log::debug!("stage degraded: {warning}");
        self.warnings.push(warning);
    }

    /// Record how long a stage took
    pub fn record_timing(&mut self, stage: Stage, elapsed: Duration) {
        self.timings.push(StageTiming { stage, elapsed });
    }

    /// Freeze the document
    pub fn finalize(mut self) -> Result<AnnotatedDocument> {
        self.advance(Stage::Finalize, PipelineState::Classified, PipelineState::Finalized)?;
        Ok(AnnotatedDocument { inner: self })
    }

    /// Whether the document has passed `state` on the happy path
    pub fn has_reached(&self, state: &PipelineState) -> bool {
        match (self.state.rank(), state.rank()) {
            (Some(current), Some(wanted)) => current >= wanted,
            _ => false,
        }
    }

    /// Current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Raw text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the raw text
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Reference date for relative date resolution
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Tokens
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// One tag per token
    pub fn tags(&self) -> &[PosTag] {
        &self.tags
    }

    /// One lemma per token, empty until lemmatized
    pub fn lemmas(&self) -> &[String] {
        self.lemmas.as_deref().unwrap_or(&[])
    }

    /// One stopword flag per token, empty until lemmatized
    pub fn stopwords(&self) -> &[bool] {
        &self.stopwords
    }

    /// Identified language, if recorded
    pub fn language(&self) -> Option<&LanguageGuess> {
        self.language.as_ref()
    }

    /// Tokens tagged by the fallback rule
    pub fn guessed_tags(&self) -> usize {
        self.guessed_tags
    }

    /// Sentences
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Entities
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Whether entity recognition was skipped
    pub fn entities_skipped(&self) -> bool {
        self.entities_skipped
    }

    /// Warnings so far
    pub fn warnings(&self) -> &[StageDegraded] {
        &self.warnings
    }

    /// Timings so far
    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }
}

/// Finalized, immutable annotation of one document
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    inner: Document,
}

impl AnnotatedDocument {
    /// Raw text
    pub fn text(&self) -> &str {
        self.inner.text()
    }

    /// Reference date used for date resolution
    pub fn reference_date(&self) -> NaiveDate {
        self.inner.reference_date
    }

    /// Tokens
    pub fn tokens(&self) -> &[Token] {
        &self.inner.tokens
    }

    /// One tag per token
    pub fn tags(&self) -> &[PosTag] {
        &self.inner.tags
    }

    /// Tokens paired with their tags
    pub fn tagged_tokens(&self) -> impl Iterator<Item = (&Token, PosTag)> + '_ {
        self.inner.tokens.iter().zip(self.inner.tags.iter().copied())
    }

    /// One lemma per token
    pub fn lemmas(&self) -> &[String] {
        self.inner.lemmas()
    }

    /// One stopword flag per token
    pub fn stopwords(&self) -> &[bool] {
        &self.inner.stopwords
    }

    /// Whether token `index` is a stopword
    pub fn is_stopword(&self, index: usize) -> bool {
        self.inner.stopwords.get(index).copied().unwrap_or(false)
    }

    /// Identified language; undetermined when the stage never ran
    pub fn language(&self) -> LanguageGuess {
        self.inner
            .language
            .clone()
            .unwrap_or_else(LanguageGuess::undetermined)
    }

    /// Sentences
    pub fn sentences(&self) -> &[Sentence] {
        &self.inner.sentences
    }

    /// Entities
    pub fn entities(&self) -> &[Entity] {
        &self.inner.entities
    }

    /// Whether entity recognition was skipped
    pub fn entities_skipped(&self) -> bool {
        self.inner.entities_skipped
    }

    /// Outcome of each requested task
    pub fn tasks(&self) -> &BTreeMap<TaskKind, TaskOutcome> {
        &self.inner.tasks
    }

    /// Outcome of one task, if it was requested
    pub fn task(&self, task: TaskKind) -> Option<&TaskOutcome> {
        self.inner.tasks.get(&task)
    }

    /// Degradation warnings
    pub fn warnings(&self) -> &[StageDegraded] {
        &self.inner.warnings
    }

    /// Per-stage timings, in execution order
    pub fn timings(&self) -> &[StageTiming] {
        &self.inner.timings
    }

    /// Always `Finalized`
    pub fn state(&self) -> &PipelineState {
        &self.inner.state
    }
}
