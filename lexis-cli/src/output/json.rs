//! JSON output formatter

use super::OutputFormatter;
use anyhow::Result;
use lexis_api::DocumentAnnotation;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// JSON formatter - one object for a single input, an array otherwise
pub struct JsonFormatter<W: Write> {
    writer: W,
    pretty: bool,
    documents: Vec<SourcedAnnotation>,
}

/// Annotation tagged with its input
#[derive(Debug, Serialize, Deserialize)]
pub struct SourcedAnnotation {
    /// File name or `<stdin>`
    pub source: String,
    /// The annotation
    #[serde(flatten)]
    pub annotation: DocumentAnnotation,
}

impl<W: Write> JsonFormatter<W> {
    /// Create a new JSON formatter
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
            documents: Vec::new(),
        }
    }

    /// Choose between indented and compact output
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    fn write_value<T: Serialize>(&mut self, value: &T) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, value)?;
        } else {
            serde_json::to_writer(&mut self.writer, value)?;
        }
        Ok(())
    }
}

impl<W: Write + Send + Sync> OutputFormatter for JsonFormatter<W> {
    fn format_document(&mut self, source: &str, annotation: &DocumentAnnotation) -> Result<()> {
        self.documents.push(SourcedAnnotation {
            source: source.to_string(),
            annotation: annotation.clone(),
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let documents = std::mem::take(&mut self.documents);
        match documents.as_slice() {
            [single] => self.write_value(single)?,
            all => self.write_value(&all)?,
        }
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}
