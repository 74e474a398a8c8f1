//! Classification task identifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A classification task served by one adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Speech act of each sentence
    SpeechAct,
    /// Question detection
    Question,
    /// Emotion classification
    Emotion,
    /// Sarcasm detection
    Sarcasm,
    /// Sentiment polarity
    Sentiment,
    /// Date mention resolution
    Date,
    /// Actionable task extraction
    Task,
}

impl TaskKind {
    /// Every task, in output order
    pub const ALL: [TaskKind; 7] = [
        TaskKind::SpeechAct,
        TaskKind::Question,
        TaskKind::Emotion,
        TaskKind::Sarcasm,
        TaskKind::Sentiment,
        TaskKind::Date,
        TaskKind::Task,
    ];

    /// Canonical task name
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::SpeechAct => "speech_act",
            TaskKind::Question => "question",
            TaskKind::Emotion => "emotion",
            TaskKind::Sarcasm => "sarcasm",
            TaskKind::Sentiment => "sentiment",
            TaskKind::Date => "date",
            TaskKind::Task => "task",
        }
    }

    /// One-line description for listings
    pub fn description(&self) -> &'static str {
        match self {
            TaskKind::SpeechAct => "Speech act of each sentence (statement, question, command, ...)",
            TaskKind::Question => "Whether each sentence is a question, and which kind",
            TaskKind::Emotion => "Dominant emotion (Plutchik's eight basic emotions)",
            TaskKind::Sarcasm => "Sarcastic versus literal sentences",
            TaskKind::Sentiment => "Positive, negative or neutral polarity",
            TaskKind::Date => "Date mentions resolved against a reference date",
            TaskKind::Task => "Requests, reminders, instructions and proposals",
        }
    }

    /// Closed label vocabulary of label-producing tasks
    ///
    /// Empty for `date` and `task`, whose results are lists.
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            TaskKind::SpeechAct => &[
                "statement",
                "question",
                "command",
                "greeting",
                "gratitude",
                "apology",
                "exclamation",
            ],
            TaskKind::Question => &["true", "false"],
            TaskKind::Emotion => &[
                "joy",
                "trust",
                "fear",
                "surprise",
                "sadness",
                "disgust",
                "anger",
                "anticipation",
                "no_emotion",
            ],
            TaskKind::Sarcasm => &["sarcastic", "not_sarcastic"],
            TaskKind::Sentiment => &["positive", "negative", "neutral"],
            TaskKind::Date | TaskKind::Task => &[],
        }
    }

    /// Whether results of this task are label results
    pub fn is_label_task(&self) -> bool {
        !self.labels().is_empty()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized task name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task '{0}' (expected one of: speech_act, question, emotion, sarcasm, sentiment, date, task)")]
pub struct UnknownTaskError(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();

        match normalized.as_str() {
            "speechact" | "speechacts" | "act" => Ok(TaskKind::SpeechAct),
            "question" | "questions" | "questiondetection" => Ok(TaskKind::Question),
            "emotion" | "emotions" | "emo" => Ok(TaskKind::Emotion),
            "sarcasm" | "sarcastic" => Ok(TaskKind::Sarcasm),
            "sentiment" | "sentiments" | "polarity" => Ok(TaskKind::Sentiment),
            "date" | "dates" | "dateresolution" => Ok(TaskKind::Date),
            "task" | "tasks" | "taskextraction" | "todo" => Ok(TaskKind::Task),
            _ => Err(UnknownTaskError(s.trim().to_string())),
        }
    }
}

/// The set of tasks requested for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskSet(BTreeSet<TaskKind>);

impl TaskSet {
    /// No tasks: only the linguistic stages run
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every task
    pub fn all() -> Self {
        TaskKind::ALL.into_iter().collect()
    }

    /// Parse a comma separated list such as `question,sentiment,date`
    ///
    /// `all` selects every task; blank entries are ignored. Every other
    /// entry must name a task, even when `all` is present.
    pub fn parse_list(list: &str) -> Result<Self, UnknownTaskError> {
        let mut set = Self::empty();
        let mut everything = false;
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name.eq_ignore_ascii_case("all") {
                everything = true;
                continue;
            }
            set.insert(name.parse()?);
        }
        Ok(if everything { Self::all() } else { set })
    }

    /// Add a task
    pub fn insert(&mut self, task: TaskKind) -> bool {
        self.0.insert(task)
    }

    /// Whether the task is requested
    pub fn contains(&self, task: TaskKind) -> bool {
        self.0.contains(&task)
    }

    /// Requested tasks in order
    pub fn iter(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.0.iter().copied()
    }

    /// Number of requested tasks
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no task is requested
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TaskKind> for TaskSet {
    fn from_iter<I: IntoIterator<Item = TaskKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[TaskKind; N]> for TaskSet {
    fn from(tasks: [TaskKind; N]) -> Self {
        tasks.into_iter().collect()
    }
}

impl FromStr for TaskSet {
    type Err = UnknownTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_list(s)
    }
}
