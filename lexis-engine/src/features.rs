//! Classifier-facing feature view
//!
//! The assembler flattens a tagged document into one normalized record per
//! token. The view is immutable and shared by every adapter through an
//! `Arc`, so adapters can run concurrently without copying.

use crate::document::{Document, PipelineState};
use crate::error::{PipelineError, Result, Stage};
use chrono::NaiveDate;
use lexis_core::{Entity, EntityType, PosTag, Sentence, Span, TokenKind};
use std::ops::Range;
use std::sync::Arc;

/// Entity membership of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityMark {
    /// Index into [`FeatureView::entities`]
    pub index: usize,
    /// Entity type
    pub entity_type: EntityType,
    /// Whether this token starts the entity
    pub begin: bool,
}

/// Normalized token record
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureToken {
    /// Surface text
    pub text: String,
    /// Lowercased text with typographic apostrophes normalized
    pub lower: String,
    /// POS tag
    pub pos: PosTag,
    /// Dictionary form (falls back to `lower` when lemmatization did not run)
    pub lemma: String,
    /// Function word excluded from [`FeatureView::content_tokens`]
    pub stopword: bool,
    /// Token kind
    pub kind: TokenKind,
    /// Byte span
    pub span: Span,
    /// Index of the enclosing sentence
    pub sentence: usize,
    /// Entity membership, if any
    pub entity: Option<EntityMark>,
}

impl FeatureToken {
    /// Word or clitic (not punctuation, symbols or numbers)
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Clitic | TokenKind::Acronym
        )
    }
}

/// Read-only view consumed by classifiers
#[derive(Debug, Clone)]
pub struct FeatureView {
    text: Arc<str>,
    tokens: Vec<FeatureToken>,
    sentences: Vec<Sentence>,
    entities: Vec<Entity>,
    entities_resolved: bool,
    reference_date: NaiveDate,
}

impl FeatureView {
    /// Raw text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every token in order
    pub fn tokens(&self) -> &[FeatureToken] {
        &self.tokens
    }

    /// Words that are not stopwords, in order
    pub fn content_tokens(&self) -> impl Iterator<Item = &FeatureToken> + '_ {
        self.tokens.iter().filter(|t| t.is_word() && !t.stopword)
    }

    /// Sentence boundaries
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Entities (empty when the entity stage was skipped)
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Whether entity recognition ran
    pub fn entities_resolved(&self) -> bool {
        self.entities_resolved
    }

    /// Reference date for relative expressions
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Whether the document has no sentences
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Tokens of sentence `index`
    pub fn sentence_tokens(&self, index: usize) -> &[FeatureToken] {
        self.sentences
            .get(index)
            .and_then(|s| self.tokens.get(s.tokens.clone()))
            .unwrap_or(&[])
    }

    /// Token index range of sentence `index`
    pub fn sentence_range(&self, index: usize) -> Range<usize> {
        self.sentences
            .get(index)
            .map(|s| s.tokens.clone())
            .unwrap_or(0..0)
    }

    /// Text of sentence `index`
    pub fn sentence_text(&self, index: usize) -> &str {
        self.sentences
            .get(index)
            .and_then(|s| self.text.get(s.span.start..s.span.end))
            .unwrap_or("")
    }

    /// Text covering tokens `range` (document indices)
    pub fn slice_tokens(&self, range: Range<usize>) -> Option<(Span, &str)> {
        let first = self.tokens.get(range.start)?;
        let last = self.tokens.get(range.end.checked_sub(1)?)?;
        let span = first.span.cover(&last.span);
        Some((span, self.text.get(span.start..span.end)?))
    }
}

/// Builds [`FeatureView`]s from tagged documents
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    /// Create an assembler
    pub fn new() -> Self {
        Self
    }

    /// Assemble the view
    ///
    /// Requires tokenization, sentence splitting and tagging to have
    /// completed; the entity stage is optional.
    pub fn assemble(&self, document: &Document) -> Result<FeatureView> {
        if !document.has_reached(&PipelineState::Tagged) {
            return Err(PipelineError::IncompleteDocument {
                stage: Stage::Classify,
                state: document.state().to_string(),
            });
        }

        let mut sentence_of = vec![0; document.tokens().len()];
        for (index, sentence) in document.sentences().iter().enumerate() {
            if let Some(slots) = sentence_of.get_mut(sentence.tokens.clone()) {
                slots.fill(index);
            }
        }

        let mut marks: Vec<Option<EntityMark>> = vec![None; document.tokens().len()];
        for (index, entity) in document.entities().iter().enumerate() {
            for token in entity.tokens.clone() {
                if let Some(slot) = marks.get_mut(token) {
                    *slot = Some(EntityMark {
                        index,
                        entity_type: entity.entity_type,
                        begin: token == entity.tokens.start,
                    });
                }
            }
        }

        let tokens = document
            .tokens()
            .iter()
            .zip(document.tags())
            .enumerate()
            .map(|(i, (token, pos))| {
                let lower = token.lower().replace('’', "'");
                FeatureToken {
                    text: token.text.clone(),
                    lemma: document
                        .lemmas()
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| lower.clone()),
                    stopword: document.stopwords().get(i).copied().unwrap_or(false),
                    lower,
                    pos: *pos,
                    kind: token.kind,
                    span: token.span,
                    sentence: sentence_of[i],
                    entity: marks[i],
                }
            })
            .collect();

        Ok(FeatureView {
            text: document.shared_text(),
            tokens,
            sentences: document.sentences().to_vec(),
            entities: document.entities().to_vec(),
            entities_resolved: !document.entities_skipped()
                && document.has_reached(&PipelineState::EntitiesResolved),
            reference_date: document.reference_date(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::LinguisticStages;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_assemble_requires_tagging() {
        let doc = Document::new("Hello.", date());
        assert!(matches!(
            FeatureAssembler::new().assemble(&doc),
            Err(PipelineError::IncompleteDocument { .. })
        ));
    }

    #[test]
    fn test_view_carries_entities_and_sentences() {
        let text = "Call John tomorrow. Thanks!";
        let doc = LinguisticStages::default().analyze(text, date(), true).unwrap();
        let view = FeatureAssembler::new().assemble(&doc).unwrap();

        assert_eq!(view.sentences().len(), 2);
        assert_eq!(view.sentence_text(1), "Thanks!");
        assert_eq!(view.sentence_tokens(1).len(), 2);
        assert!(view.entities_resolved());

        let john = &view.tokens()[1];
        assert_eq!(john.lower, "john");
        assert_eq!(john.sentence, 0);
        let mark = john.entity.unwrap();
        assert!(mark.begin);
        assert_eq!(mark.entity_type, EntityType::Person);
        assert_eq!(view.tokens()[4].sentence, 1);
        assert_eq!(view.reference_date(), date());
    }

    #[test]
    fn test_tokens_carry_lemma_and_stopword_flag() {
        let text = "The reports were sent to the managers.";
        let doc = LinguisticStages::default().analyze(text, date(), true).unwrap();
        let view = FeatureAssembler::new().assemble(&doc).unwrap();

        let lemmas: Vec<&str> = view.tokens().iter().map(|t| t.lemma.as_str()).collect();
        assert_eq!(lemmas, ["the", "report", "be", "send", "to", "the", "manager", "."]);

        let content: Vec<&str> = view.content_tokens().map(|t| t.text.as_str()).collect();
        assert_eq!(content, ["reports", "sent", "managers"]);
        assert!(view.tokens()[0].stopword);
    }

    #[test]
    fn test_skipped_entities_leave_marks_empty() {
        let text = "Call John tomorrow.";
        let doc = LinguisticStages::default().analyze(text, date(), false).unwrap();
        let view = FeatureAssembler::new().assemble(&doc).unwrap();
        assert!(!view.entities_resolved());
        assert!(view.tokens().iter().all(|t| t.entity.is_none()));
    }

    #[test]
    fn test_empty_document_view() {
        let doc = LinguisticStages::default().analyze("", date(), true).unwrap();
        let view = FeatureAssembler::new().assemble(&doc).unwrap();
        assert!(view.is_empty());
        assert!(view.sentence_tokens(0).is_empty());
        assert_eq!(view.sentence_text(3), "");
    }
}
