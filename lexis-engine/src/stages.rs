//! Linguistic stages run against a [`Document`]
//!
//! Tokenize, identify the language, split, tag, lemmatize and (optionally)
//! recognize entities, recording each output on the document together with
//! its timing and any degradation.

use crate::document::Document;
use crate::error::{DegradationKind, PipelineError, Result, Stage, StageDegraded};
use chrono::NaiveDate;
use lexis_core::{
    language, EntityRecognizer, LanguageIdentifier, LanguageTables, Lemmatizer, SentenceSplitter,
    Span, Tagger, TokenKind, Tokenizer,
};
use std::sync::Arc;
use std::time::Instant;

/// Share of fallback-tagged tokens above which tagging is reported degraded
const UNKNOWN_RATIO_WARNING: f32 = 0.5;
/// Minimum token count before the unknown ratio is meaningful
const UNKNOWN_RATIO_MIN_TOKENS: usize = 4;

/// The deterministic linguistic core, configured once and shared
#[derive(Debug, Clone)]
pub struct LinguisticStages {
    tables: Arc<LanguageTables>,
    tokenizer: Tokenizer,
    identifier: LanguageIdentifier,
    splitter: SentenceSplitter,
    tagger: Tagger,
    lemmatizer: Lemmatizer,
    recognizer: EntityRecognizer,
}

impl Default for LinguisticStages {
    fn default() -> Self {
        Self::new(language::english(), lexis_core::DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl LinguisticStages {
    /// Build the stages over `tables`, parallelizing documents with more
    /// than `parallel_threshold` sentences
    pub fn new(tables: Arc<LanguageTables>, parallel_threshold: usize) -> Self {
        Self {
            tokenizer: Tokenizer::new(),
            identifier: LanguageIdentifier::new(Arc::clone(&tables)),
            splitter: SentenceSplitter::new(Arc::clone(&tables)),
            tagger: Tagger::new(Arc::clone(&tables)).with_parallel_threshold(parallel_threshold),
            lemmatizer: Lemmatizer::new(Arc::clone(&tables)),
            recognizer: EntityRecognizer::new(Arc::clone(&tables))
                .with_parallel_threshold(parallel_threshold),
            tables,
        }
    }

    /// Run every linguistic stage on `text`
    ///
    /// The returned document is in the `EntitiesResolved` state. Entity
    /// recognition is skipped (and a warning recorded) when `entities` is
    /// false.
    pub fn analyze(
        &self,
        text: impl Into<Arc<str>>,
        reference_date: NaiveDate,
        entities: bool,
    ) -> Result<Document> {
        self.run(text.into(), None, reference_date, entities)
    }

    /// Like [`analyze`](Self::analyze), for text assembled from sentences the
    /// caller already split: each segment becomes exactly one sentence
    pub fn analyze_segments(
        &self,
        text: impl Into<Arc<str>>,
        segments: &[Span],
        reference_date: NaiveDate,
        entities: bool,
    ) -> Result<Document> {
        self.run(text.into(), Some(segments), reference_date, entities)
    }

    fn run(
        &self,
        text: Arc<str>,
        segments: Option<&[Span]>,
        reference_date: NaiveDate,
        entities: bool,
    ) -> Result<Document> {
        let mut doc = Document::new(text, reference_date);
        let text = doc.shared_text();

        let started = Instant::now();
        let tokens = self.tokenizer.tokenize(&text);
        doc.record_timing(Stage::Tokenize, started.elapsed());
        if tokens.is_empty() {
            doc.warn(StageDegraded::new(
                Stage::Tokenize,
                DegradationKind::EmptyInput,
                "input contains no tokens",
            ));
        }
        doc.record_tokens(tokens)?;

        let started = Instant::now();
        let guess = self.identifier.identify(doc.tokens());
        doc.record_timing(Stage::IdentifyLanguage, started.elapsed());
        if !guess.is_determined() && guess.probability > 0.0 {
            doc.warn(StageDegraded::new(
                Stage::IdentifyLanguage,
                DegradationKind::UndeterminedLanguage,
                format!("text does not look like {}", self.identifier.language_name()),
            ));
        }
        doc.record_language(guess)?;

        let started = Instant::now();
        let sentences = match segments {
            Some(segments) => self.splitter.split_segments(doc.tokens(), segments),
            None => self.splitter.split(&text, doc.tokens()),
        };
        doc.record_timing(Stage::SentenceSplit, started.elapsed());
        if let Some(warning) = missing_terminal(&doc) {
            doc.warn(warning);
        }
        doc.record_sentences(sentences)?;

        let started = Instant::now();
        let tags = match self.tagger.tag_all(doc.sentences(), doc.tokens()) {
            Ok(tags) => tags,
            Err(source) => return Err(fail(&mut doc, Stage::Tag, source)),
        };
        doc.record_timing(Stage::Tag, started.elapsed());
        doc.record_tags(tags.clone())?;
        if let Some(warning) = unknown_ratio(&doc) {
            doc.warn(warning);
        }

        let started = Instant::now();
        let lemmas = match self.lemmatizer.lemmatize(doc.tokens(), doc.tags()) {
            Ok(lemmas) => lemmas,
            Err(source) => return Err(fail(&mut doc, Stage::Lemmatize, source)),
        };
        let stopwords = doc
            .tokens()
            .iter()
            .map(|t| self.tables.is_stopword(&t.text.replace('’', "'")))
            .collect();
        doc.record_timing(Stage::Lemmatize, started.elapsed());
        doc.record_lemmas(lemmas, stopwords)?;

        if entities {
            let started = Instant::now();
            let found = self.recognizer.recognize_all(
                &text,
                doc.sentences(),
                doc.tokens(),
                &tags,
            );
            let found = match found {
                Ok(found) => found,
                Err(source) => return Err(fail(&mut doc, Stage::EntityRecognize, source)),
            };
            doc.record_timing(Stage::EntityRecognize, started.elapsed());
            doc.record_entities(Some(found))?;
        } else {
            doc.warn(StageDegraded::new(
                Stage::EntityRecognize,
                DegradationKind::EntitiesSkipped,
                "entity recognition disabled",
            ));
            doc.record_entities(None)?;
        }

        Ok(doc)
    }
}

fn fail(doc: &mut Document, stage: Stage, source: lexis_core::CoreError) -> PipelineError {
    doc.fail(stage, source.to_string());
    PipelineError::Stage { stage, source }
}

/// Multi-word text that never uses sentence-final punctuation
fn missing_terminal(doc: &Document) -> Option<StageDegraded> {
    let words = doc
        .tokens()
        .iter()
        .filter(|t| t.kind == TokenKind::Word)
        .count();
    let has_terminal = doc
        .tokens()
        .iter()
        .any(|t| t.kind == TokenKind::Punctuation && t.text.contains(['.', '!', '?', '…']));

    (words >= 3 && !has_terminal).then(|| {
        StageDegraded::new(
            Stage::SentenceSplit,
            DegradationKind::NoTerminalPunctuation,
            format!("{words} words without sentence-final punctuation"),
        )
    })
}

fn unknown_ratio(doc: &Document) -> Option<StageDegraded> {
    let total = doc.tokens().len();
    if total < UNKNOWN_RATIO_MIN_TOKENS {
        return None;
    }
    let ratio = doc.guessed_tags() as f32 / total as f32;
    (ratio > UNKNOWN_RATIO_WARNING).then(|| {
        StageDegraded::new(
            Stage::Tag,
            DegradationKind::HighUnknownRatio,
            format!("{:.0}% of tokens tagged without lexical evidence", ratio * 100.0),
        )
    })
}
