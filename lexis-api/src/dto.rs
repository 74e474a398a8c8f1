//! Data Transfer Objects for API

use lexis_engine::{
    AnnotatedDocument, DegradationKind, Entity, Sentence, TaskError, TaskKind, TaskResult,
    TokenKind,
};
use std::collections::BTreeMap;

/// A token with its part-of-speech tag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenAnnotation {
    /// Surface text
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Token class (`word`, `number`, `punctuation`, ...)
    pub kind: String,
    /// Universal POS tag
    pub pos: String,
    /// Dictionary form
    pub lemma: String,
    /// Whether the token is a stopword
    pub stopword: bool,
}

/// A sentence and the tokens it spans
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SentenceAnnotation {
    /// Sentence text
    pub text: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Index of the first token
    pub token_start: usize,
    /// Index one past the last token
    pub token_end: usize,
    /// Paragraph index
    pub paragraph: usize,
}

/// A named entity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityAnnotation {
    /// Surface text
    pub text: String,
    /// Entity type (`PERSON`, `DATE`, ...)
    pub entity_type: String,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
    /// Index of the first token
    pub token_start: usize,
    /// Index one past the last token
    pub token_end: usize,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Why a task produced no result
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaskFailure {
    /// `model_unavailable`, `timeout` or `internal`
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

impl From<&TaskError> for TaskFailure {
    fn from(error: &TaskError) -> Self {
        Self {
            error: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Result of one task: the typed result or the failure that replaced it
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum TaskAnnotation {
    /// The task produced a result
    Ok(TaskResult),
    /// The task failed; other tasks are unaffected
    Failed(TaskFailure),
}

impl TaskAnnotation {
    /// The result, if the task succeeded
    pub fn result(&self) -> Option<&TaskResult> {
        match self {
            TaskAnnotation::Ok(result) => Some(result),
            TaskAnnotation::Failed(_) => None,
        }
    }

    /// The failure, if the task failed
    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            TaskAnnotation::Ok(_) => None,
            TaskAnnotation::Failed(failure) => Some(failure),
        }
    }
}

/// Non-fatal warning raised by a linguistic stage
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarningAnnotation {
    /// Stage that degraded
    pub stage: String,
    /// Kind of degradation
    pub kind: String,
    /// Detail
    pub message: String,
}

/// Complete annotation of one document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentAnnotation {
    /// Original text
    pub text: String,
    /// Identified language code, `und` when undetermined
    pub language: String,
    /// Probability of `language` in [0, 1]
    pub language_probability: f32,
    /// Day relative dates were resolved against
    pub reference_date: String,
    /// Tokens in order
    pub tokens: Vec<TokenAnnotation>,
    /// Sentences in order
    pub sentences: Vec<SentenceAnnotation>,
    /// Entities in order
    pub entities: Vec<EntityAnnotation>,
    /// One entry per requested task, keyed by task name
    pub tasks: BTreeMap<String, TaskAnnotation>,
    /// Stage warnings
    pub warnings: Vec<WarningAnnotation>,
    /// Milliseconds per stage, present when benchmarking
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub stats: Option<BTreeMap<String, f64>>,
}

impl DocumentAnnotation {
    /// Convert an engine document; `stats` adds per-stage timings
    pub fn from_document(doc: &AnnotatedDocument, stats: bool) -> Self {
        let text = doc.text();
        let language = doc.language();
        Self {
            text: text.to_string(),
            language: language.code,
            language_probability: language.probability,
            reference_date: doc.reference_date().to_string(),
            tokens: doc
                .tagged_tokens()
                .enumerate()
                .map(|(i, (token, pos))| TokenAnnotation {
                    text: token.text.clone(),
                    start: token.span.start,
                    end: token.span.end,
                    kind: token_kind_name(token.kind).to_string(),
                    pos: pos.as_str().to_string(),
                    lemma: doc
                        .lemmas()
                        .get(i)
                        .cloned()
                        .unwrap_or_else(|| token.lower()),
                    stopword: doc.is_stopword(i),
                })
                .collect(),
            sentences: doc.sentences().iter().map(|s| sentence(text, s)).collect(),
            entities: doc.entities().iter().map(entity).collect(),
            tasks: doc
                .tasks()
                .iter()
                .map(|(task, outcome)| {
                    let annotation = match outcome {
                        Ok(result) => TaskAnnotation::Ok(result.clone()),
                        Err(e) => TaskAnnotation::Failed(e.into()),
                    };
                    (task.as_str().to_string(), annotation)
                })
                .collect(),
            warnings: doc
                .warnings()
                .iter()
                .map(|w| WarningAnnotation {
                    stage: w.stage.as_str().to_string(),
                    kind: w.kind.as_str().to_string(),
                    message: w.message.clone(),
                })
                .collect(),
            stats: stats.then(|| stage_stats(doc)),
        }
    }

    /// Annotation of one task
    pub fn task(&self, task: TaskKind) -> Option<&TaskAnnotation> {
        self.tasks.get(task.as_str())
    }

    /// Words that are not stopwords, in order
    pub fn tokens_filtered(&self) -> impl Iterator<Item = &TokenAnnotation> + '_ {
        self.tokens
            .iter()
            .filter(|t| !t.stopword && matches!(t.kind.as_str(), "word" | "acronym"))
    }

    /// Whether any warning of `kind` was raised
    pub fn has_warning(&self, kind: DegradationKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind.as_str())
    }

    /// Serialize to a JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to an indented JSON string
    #[cfg(feature = "serde")]
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn sentence(text: &str, sentence: &Sentence) -> SentenceAnnotation {
    SentenceAnnotation {
        text: text
            .get(sentence.span.start..sentence.span.end)
            .unwrap_or_default()
            .to_string(),
        start: sentence.span.start,
        end: sentence.span.end,
        token_start: sentence.tokens.start,
        token_end: sentence.tokens.end,
        paragraph: sentence.paragraph,
    }
}

fn entity(entity: &Entity) -> EntityAnnotation {
    EntityAnnotation {
        text: entity.text.clone(),
        entity_type: entity.entity_type.as_str().to_string(),
        start: entity.span.start,
        end: entity.span.end,
        token_start: entity.tokens.start,
        token_end: entity.tokens.end,
        confidence: entity.confidence,
    }
}

fn stage_stats(doc: &AnnotatedDocument) -> BTreeMap<String, f64> {
    let mut stats = BTreeMap::new();
    let mut total = 0.0;
    for timing in doc.timings() {
        let ms = timing.elapsed.as_secs_f64() * 1000.0;
        *stats.entry(timing.stage.as_str().to_string()).or_insert(0.0) += ms;
        total += ms;
    }
    stats.insert("total".to_string(), total);
    stats
}

fn token_kind_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Word => "word",
        TokenKind::Number => "number",
        TokenKind::Punctuation => "punctuation",
        TokenKind::Symbol => "symbol",
        TokenKind::Url => "url",
        TokenKind::Email => "email",
        TokenKind::Acronym => "acronym",
        TokenKind::Clitic => "clitic",
    }
}
