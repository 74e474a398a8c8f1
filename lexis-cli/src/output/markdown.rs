//! Markdown output formatter

use super::{describe_date, describe_label, label_tasks, sentence_labels, OutputFormatter};
use anyhow::Result;
use lexis_api::DocumentAnnotation;
use std::io::Write;

/// Markdown formatter - one section per input with a sentence table
pub struct MarkdownFormatter<W: Write> {
    writer: W,
    sentence_count: usize,
}

impl<W: Write> MarkdownFormatter<W> {
    /// Create a new markdown formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            sentence_count: 0,
        }
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl<W: Write + Send + Sync> OutputFormatter for MarkdownFormatter<W> {
    fn format_document(&mut self, source: &str, annotation: &DocumentAnnotation) -> Result<()> {
        let w = &mut self.writer;
        writeln!(w, "## {source}")?;
        writeln!(w)?;

        let columns = label_tasks(annotation);
        write!(w, "| # | Sentence |")?;
        for column in &columns {
            write!(w, " {column} |")?;
        }
        writeln!(w)?;
        writeln!(w, "|---|---|{}", "---|".repeat(columns.len()))?;

        for (i, sentence) in annotation.sentences.iter().enumerate() {
            write!(w, "| {} | {} |", i + 1, cell(&sentence.text))?;
            let labels = sentence_labels(annotation, i);
            for column in &columns {
                let value = labels
                    .iter()
                    .find(|(task, _)| task == column)
                    .map(|(_, label)| describe_label(label))
                    .unwrap_or_default();
                write!(w, " {value} |")?;
            }
            writeln!(w)?;
        }
        self.sentence_count += annotation.sentences.len();

        for (name, task) in &annotation.tasks {
            match (task.result(), task.failure()) {
                (Some(result), _) => {
                    if let Some(dates) = result.as_dates().filter(|d| !d.is_empty()) {
                        writeln!(w, "\n**{name}**\n")?;
                        for date in dates {
                            writeln!(w, "- {} → {}", date.text, describe_date(&date.resolved))?;
                        }
                    }
                    if let Some(tasks) = result.as_tasks().filter(|t| !t.is_empty()) {
                        writeln!(w, "\n**{name}**\n")?;
                        for found in tasks {
                            writeln!(w, "- *{:?}*: {}", found.category, found.text)?;
                        }
                    }
                }
                (None, Some(failure)) => {
                    writeln!(w, "\n> **{name}** failed ({}): {}", failure.error, failure.message)?;
                }
                (None, None) => {}
            }
        }
        writeln!(w)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "---")?;
        writeln!(self.writer, "*Total sentences: {}*", self.sentence_count)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::annotate;

    #[test]
    fn test_table_and_footer() {
        let mut formatter = MarkdownFormatter::new(Vec::new());
        formatter
            .format_document("memo.txt", &annotate("Is it a | b? Let's meet next week."))
            .unwrap();
        formatter.finish().unwrap();
        let out = String::from_utf8(formatter.writer).unwrap();

        assert!(out.starts_with("## memo.txt\n"));
        assert!(out.contains("| # | Sentence | emotion | question |"));
        assert!(out.contains("Is it a \\| b?"));
        assert!(out.contains("*Total sentences: 2*"));
    }
}
