//! Plain text output formatter

use super::{describe_date, describe_label, sentence_labels, OutputFormatter};
use anyhow::Result;
use lexis_api::DocumentAnnotation;
use std::io::{self, Write};

/// Plain text formatter - one sentence per line followed by its labels
pub struct TextFormatter<W: Write> {
    writer: W,
    show_source: bool,
}

impl<W: Write> TextFormatter<W> {
    /// Create a new text formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            show_source: false,
        }
    }

    /// Print a `== source ==` header before each document
    pub fn with_source_headers(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }
}

impl TextFormatter<io::Stdout> {
    /// Create a formatter that writes to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for TextFormatter<W> {
    fn format_document(&mut self, source: &str, annotation: &DocumentAnnotation) -> Result<()> {
        let w = &mut self.writer;
        if self.show_source {
            writeln!(w, "== {source} ==")?;
        }

        for (i, sentence) in annotation.sentences.iter().enumerate() {
            writeln!(w, "[{}] {}", i + 1, sentence.text)?;
            for (task, label) in sentence_labels(annotation, i) {
                writeln!(w, "    {task}: {}", describe_label(label))?;
            }
        }

        if !annotation.entities.is_empty() {
            writeln!(w, "entities:")?;
            for entity in &annotation.entities {
                writeln!(
                    w,
                    "    {} {} ({:.2})",
                    entity.text, entity.entity_type, entity.confidence
                )?;
            }
        }

        for (name, task) in &annotation.tasks {
            let Some(result) = task.result() else { continue };
            if let Some(dates) = result.as_dates().filter(|d| !d.is_empty()) {
                writeln!(w, "{name}:")?;
                for date in dates {
                    writeln!(w, "    \"{}\" -> {}", date.text, describe_date(&date.resolved))?;
                }
            }
            if let Some(tasks) = result.as_tasks().filter(|t| !t.is_empty()) {
                writeln!(w, "{name}:")?;
                for found in tasks {
                    writeln!(w, "    {:?}: \"{}\"", found.category, found.text)?;
                }
            }
        }

        let failures: Vec<_> = annotation
            .tasks
            .iter()
            .filter_map(|(name, task)| task.failure().map(|f| (name, f)))
            .collect();
        if !failures.is_empty() {
            writeln!(w, "errors:")?;
            for (name, failure) in failures {
                writeln!(w, "    {name}: {}", failure.message)?;
            }
        }

        for warning in &annotation.warnings {
            writeln!(w, "warning: {}: {}", warning.stage, warning.message)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::annotate;

    fn render(text: &str) -> String {
        let mut formatter = TextFormatter::new(Vec::new()).with_source_headers(true);
        formatter
            .format_document("note.txt", &annotate(text))
            .unwrap();
        formatter.finish().unwrap();
        String::from_utf8(formatter.writer).unwrap()
    }

    #[test]
    fn test_sentences_and_labels() {
        let out = render("Can you send me the report by Friday? I'm so thrilled.");
        assert!(out.starts_with("== note.txt ==\n[1] Can you send me the report by Friday?\n"));
        assert!(out.contains("[2] I'm so thrilled."));
        assert!(out.contains("    question: true"));
        assert!(out.contains("\"Friday\" -> 2024-03-08"));
        assert!(out.contains("Request: \"send me the report by Friday\""));
    }

    #[test]
    fn test_empty_document_warns() {
        let out = render("");
        assert!(out.contains("warning: tokenize"));
    }
}
