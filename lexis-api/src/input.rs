//! Input sources

use crate::error::{ApiError, Result};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

/// Input source for annotation
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Input {
    /// Raw text string
    Text(String),
    /// File path
    File(PathBuf),
    /// Raw bytes, which must be UTF-8
    Bytes(Vec<u8>),
    /// Sentences already split by the caller, kept as given
    Sentences(Vec<String>),
    /// Reader (not serializable)
    #[cfg_attr(feature = "serde", serde(skip))]
    Reader(Box<dyn Read + Send>),
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Input::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Input::File(path) => f.debug_tuple("File").field(path).finish(),
            Input::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Input::Sentences(sentences) => f.debug_tuple("Sentences").field(&sentences.len()).finish(),
            Input::Reader(_) => f.debug_tuple("Reader").field(&"<dyn Read>").finish(),
        }
    }
}

impl Input {
    /// Create input from text
    pub fn from_text(text: impl Into<String>) -> Self {
        Input::Text(text.into())
    }

    /// Create input from file path
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Input::File(path.into())
    }

    /// Create input from bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Input::Bytes(bytes)
    }

    /// Create input from sentences that must not be re-split
    pub fn from_sentences<I, S>(sentences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Input::Sentences(sentences.into_iter().map(Into::into).collect())
    }

    /// Create input from a reader
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Read the text content from the input
    ///
    /// Content that is not UTF-8 is [`ApiError::MalformedInput`]. Sentences
    /// are joined with newlines.
    pub fn read_text(self) -> Result<String> {
        match self {
            Input::Text(text) => Ok(text),
            Input::File(path) => decode(fs::read(&path)?),
            Input::Bytes(bytes) => decode(bytes),
            Input::Sentences(sentences) => Ok(sentences.join("\n")),
            Input::Reader(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer)?;
                decode(buffer)
            }
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::from_text(text)
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Text(text)
    }
}

fn decode(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| ApiError::MalformedInput(format!("input is not valid UTF-8: {}", e.utf8_error())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_input() {
        let input = Input::from_reader(Cursor::new("Hello there.".as_bytes().to_vec()));
        assert_eq!(input.read_text().unwrap(), "Hello there.");
    }

    #[test]
    fn test_sentences_input_joins_lines() {
        let input = Input::from_sentences(["One.", "Two"]);
        assert_eq!(format!("{input:?}"), "Sentences(2)");
        assert_eq!(input.read_text().unwrap(), "One.\nTwo");
    }

    #[test]
    fn test_invalid_bytes_are_malformed() {
        let err = Input::from_bytes(vec![b'h', 0xc3, 0x28]).read_text().unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_missing_file_is_io() {
        let err = Input::from_file("/nonexistent/lexis-input.txt")
            .read_text()
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
