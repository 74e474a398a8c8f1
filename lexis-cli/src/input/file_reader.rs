//! File reading utilities

use anyhow::{Context, Result};
use lexis_api::Input;
use std::fs;
use std::io::Read;
use std::path::Path;

/// One document to annotate and where it came from
#[derive(Debug)]
pub struct InputDocument {
    /// File name or `<stdin>`
    pub source: String,
    /// Raw content, validated as UTF-8 by the analyzer
    pub input: Input,
}

impl InputDocument {
    /// Treat every line as one already split sentence
    ///
    /// Content that is not UTF-8 is left as is for the analyzer to reject.
    pub fn sentence_per_line(self) -> Self {
        let input = match self.input {
            Input::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Input::from_sentences(text.lines()),
                Err(e) => Input::from_bytes(e.into_bytes()),
            },
            other => other,
        };
        Self {
            source: self.source,
            input,
        }
    }
}

/// File reader that leaves UTF-8 validation to the analyzer
pub struct FileReader;

impl FileReader {
    /// Read a file as an annotation input
    pub fn read(path: &Path) -> Result<InputDocument> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());

        Ok(InputDocument {
            source: path.display().to_string(),
            input: Input::from_bytes(bytes),
        })
    }

    /// Read all of `reader` (usually standard input)
    pub fn read_stream(mut reader: impl Read, source: &str) -> Result<InputDocument> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {source}"))?;

        Ok(InputDocument {
            source: source.to_string(),
            input: Input::from_bytes(bytes),
        })
    }

    /// Get file size in bytes
    pub fn file_size(path: &Path) -> Result<u64> {
        let metadata = fs::metadata(path)
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?;

        Ok(metadata.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_read_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");

        let content = "Hello, world!\nThis is a test.";
        fs::write(&file_path, content).unwrap();

        let doc = FileReader::read(&file_path).unwrap();
        assert!(doc.source.ends_with("test.txt"));
        assert_eq!(doc.input.read_text().unwrap(), content);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let path = Path::new("/nonexistent/file.txt");
        let err_msg = FileReader::read(path).unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_invalid_utf8_is_deferred() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("latin1.txt");
        fs::write(&file_path, [b'c', b'a', b'f', 0xe9]).unwrap();

        let doc = FileReader::read(&file_path).unwrap();
        assert!(doc.input.read_text().is_err());
    }

    #[test]
    fn test_read_stream() {
        let doc = FileReader::read_stream(Cursor::new("Hi there."), "<stdin>").unwrap();
        assert_eq!(doc.source, "<stdin>");
        assert_eq!(doc.input.read_text().unwrap(), "Hi there.");
    }

    #[test]
    fn test_sentence_per_line() {
        let doc = FileReader::read_stream(Cursor::new("first line\nsecond. still second"), "<stdin>")
            .unwrap()
            .sentence_per_line();
        assert!(matches!(&doc.input, Input::Sentences(lines) if lines.len() == 2));

        let raw = FileReader::read_stream(Cursor::new(vec![0xff, b'\n']), "<stdin>")
            .unwrap()
            .sentence_per_line();
        assert!(raw.input.read_text().is_err());
    }

    #[test]
    fn test_file_size() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("sized.txt");
        fs::write(&file_path, "a".repeat(1024)).unwrap();

        assert_eq!(FileReader::file_size(&file_path).unwrap(), 1024);
    }
}
