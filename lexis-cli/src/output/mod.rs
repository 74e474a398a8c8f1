//! Output formatting module

use anyhow::Result;
use lexis_api::{DateValue, DocumentAnnotation, SentenceLabel};

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Format and output the annotation of one input
    fn format_document(&mut self, source: &str, annotation: &DocumentAnnotation) -> Result<()>;

    /// Finalize output (e.g., close JSON array)
    fn finish(&mut self) -> Result<()>;
}

pub mod json;
pub mod markdown;
pub mod text;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use text::TextFormatter;

/// Per-sentence labels of every label task, in task name order
pub(crate) fn sentence_labels(
    annotation: &DocumentAnnotation,
    sentence: usize,
) -> Vec<(&str, &SentenceLabel)> {
    annotation
        .tasks
        .iter()
        .filter_map(|(name, task)| {
            let label = task.result()?.as_label()?;
            label
                .sentences
                .iter()
                .find(|s| s.sentence == sentence)
                .map(|s| (name.as_str(), s))
        })
        .collect()
}

/// Label tasks whose result has a document label
pub(crate) fn label_tasks(annotation: &DocumentAnnotation) -> Vec<&str> {
    annotation
        .tasks
        .iter()
        .filter(|(_, task)| task.result().and_then(|r| r.as_label()).is_some())
        .map(|(name, _)| name.as_str())
        .collect()
}

pub(crate) fn describe_label(label: &SentenceLabel) -> String {
    match &label.detail {
        Some(detail) => format!("{} [{}] ({:.2})", label.label, detail, label.score),
        None => format!("{} ({:.2})", label.label, label.score),
    }
}

pub(crate) fn describe_date(value: &DateValue) -> String {
    match value {
        DateValue::Day { date } => date.to_string(),
        DateValue::Range { start, end } => format!("{start} .. {end}"),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use lexis_api::{Config, DocumentAnnotation, TaskSet};

    pub fn annotate(text: &str) -> DocumentAnnotation {
        let config = Config::builder()
            .reference_date(chrono::NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())
            .build()
            .unwrap();
        lexis_api::Analyzer::with_config(config)
            .unwrap()
            .annotate_tasks(text, &TaskSet::all())
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_labels_follow_task_names() {
        let annotation = test_support::annotate("Is it ready? I love it.");
        let names: Vec<_> = sentence_labels(&annotation, 1).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ["emotion", "question", "sarcasm", "sentiment", "speech_act"]);
        assert_eq!(label_tasks(&annotation).len(), 5);
    }

    #[test]
    fn test_describe_date_range() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(
            describe_date(&DateValue::Range { start, end }),
            "2024-03-11 .. 2024-03-17"
        );
    }
}
