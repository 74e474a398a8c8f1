//! Typed per-task results

use crate::classify::task::TaskKind;
use chrono::NaiveDate;
use lexis_core::Span;
use serde::{Deserialize, Serialize};

/// Output of one classification task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskResult {
    /// Document label plus one label per sentence
    Label(LabelResult),
    /// Resolved date mentions
    Dates {
        /// Mentions in document order
        dates: Vec<ResolvedDate>,
    },
    /// Extracted actionable phrases
    Tasks {
        /// Tasks in document order
        tasks: Vec<ExtractedTask>,
    },
}

/// Document-level label with per-sentence breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelResult {
    /// Document label
    pub label: String,
    /// Confidence of the document label in [0, 1]
    pub score: f32,
    /// One entry per sentence, in order
    pub sentences: Vec<SentenceLabel>,
}

/// Label of a single sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceLabel {
    /// Sentence index
    pub sentence: usize,
    /// Sentence label
    pub label: String,
    /// Confidence in [0, 1]
    pub score: f32,
    /// Finer-grained label, such as the question type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A date mention and its calendar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDate {
    /// Byte span of the mention
    pub span: Span,
    /// Surface text
    pub text: String,
    /// Sentence index
    pub sentence: usize,
    /// Calendar value
    pub resolved: DateValue,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// A single day or an inclusive range of days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateValue {
    /// One calendar day
    Day {
        /// The day
        date: NaiveDate,
    },
    /// Inclusive range such as "next week"
    Range {
        /// First day
        start: NaiveDate,
        /// Last day
        end: NaiveDate,
    },
}

/// Kind of actionable phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Asked of the reader ("can you send ...")
    Request,
    /// Something not to forget ("remember to ...")
    Reminder,
    /// Direct imperative ("send the report")
    Instruction,
    /// Suggested joint action ("let's meet ...")
    Proposal,
}

/// An actionable phrase found in the text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTask {
    /// Byte span of the phrase
    pub span: Span,
    /// The imperative phrase
    pub text: String,
    /// Sentence index
    pub sentence: usize,
    /// Kind of task
    pub category: TaskCategory,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl TaskResult {
    /// Label result, if this is one
    pub fn as_label(&self) -> Option<&LabelResult> {
        match self {
            TaskResult::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Date mentions, if this is a date result
    pub fn as_dates(&self) -> Option<&[ResolvedDate]> {
        match self {
            TaskResult::Dates { dates } => Some(dates),
            _ => None,
        }
    }

    /// Extracted tasks, if this is a task result
    pub fn as_tasks(&self) -> Option<&[ExtractedTask]> {
        match self {
            TaskResult::Tasks { tasks } => Some(tasks),
            _ => None,
        }
    }

    /// Name of the variant, for diagnostics
    pub fn shape(&self) -> &'static str {
        match self {
            TaskResult::Label(_) => "label",
            TaskResult::Dates { .. } => "dates",
            TaskResult::Tasks { .. } => "tasks",
        }
    }

    /// Check that the result is a well-formed answer for `task`
    ///
    /// Label results must use the task's vocabulary and scores in [0, 1].
    pub fn conforms_to(&self, task: TaskKind) -> Result<(), String> {
        let in_unit = |score: f32| (0.0..=1.0).contains(&score);

        match (task, self) {
            (TaskKind::Date, TaskResult::Dates { dates }) => dates
                .iter()
                .all(|d| in_unit(d.confidence))
                .then_some(())
                .ok_or_else(|| "date confidence outside [0, 1]".to_string()),
            (TaskKind::Task, TaskResult::Tasks { tasks }) => tasks
                .iter()
                .all(|t| in_unit(t.confidence))
                .then_some(())
                .ok_or_else(|| "task confidence outside [0, 1]".to_string()),
            (task, TaskResult::Label(result)) if task.is_label_task() => {
                let vocabulary = task.labels();
                let labels = std::iter::once((&result.label, result.score))
                    .chain(result.sentences.iter().map(|s| (&s.label, s.score)));
                for (label, score) in labels {
                    if !vocabulary.contains(&label.as_str()) {
                        return Err(format!("label '{label}' is not in the {task} vocabulary"));
                    }
                    if !in_unit(score) {
                        return Err(format!("score {score} for '{label}' is outside [0, 1]"));
                    }
                }
                Ok(())
            }
            (task, other) => Err(format!(
                "a {} result does not answer the {task} task",
                other.shape()
            )),
        }
    }
}

impl LabelResult {
    /// Result for a document without sentences
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            score: 0.0,
            sentences: Vec::new(),
        }
    }

    /// Aggregate sentence labels into a document label
    ///
    /// The document label is the one with the highest summed score; ties go
    /// to the label seen first.
    pub fn from_sentences(sentences: Vec<SentenceLabel>, fallback: &str) -> Self {
        let mut totals: Vec<(&str, f32, usize)> = Vec::new();
        for s in &sentences {
            match totals.iter_mut().find(|(label, _, _)| *label == s.label) {
                Some(entry) => {
                    entry.1 += s.score;
                    entry.2 += 1;
                }
                None => totals.push((s.label.as_str(), s.score, 1)),
            }
        }

        let best = totals
            .iter()
            .fold(None::<&(&str, f32, usize)>, |best, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
            .map(|(label, total, count)| (label.to_string(), total / *count as f32));

        match best {
            Some((label, score)) => Self {
                label,
                score,
                sentences,
            },
            None => Self::empty(fallback),
        }
    }

    /// Like [`from_sentences`](Self::from_sentences), but `default` only
    /// becomes the document label when no sentence carries another label
    pub fn from_sentences_preferring(sentences: Vec<SentenceLabel>, default: &str) -> Self {
        let marked: Vec<SentenceLabel> = sentences
            .iter()
            .filter(|s| s.label != default)
            .cloned()
            .collect();
        if marked.is_empty() {
            return Self::from_sentences(sentences, default);
        }

        let summary = Self::from_sentences(marked, default);
        Self {
            label: summary.label,
            score: summary.score,
            sentences,
        }
    }
}
