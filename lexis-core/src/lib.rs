//! Deterministic linguistic core for Lexis
//!
//! This crate holds the rule-based stages of the annotation pipeline. Each
//! stage is a pure function of its input and the shared language tables:
//!
//! - [`Tokenizer`]: text to tokens with exact byte spans
//! - [`SentenceSplitter`]: tokens to sentences and paragraphs
//! - [`Tagger`]: one Universal POS tag per token
//! - [`Lemmatizer`]: dictionary form of each tagged token
//! - [`EntityRecognizer`]: non-overlapping entities within sentences
//!
//! Language data (abbreviations, lexicon, gazetteers) lives in TOML and is
//! loaded once per process, see [`language`]. The same tables back the
//! [`LanguageIdentifier`].
//!
//! # Example
//!
//! ```rust
//! use lexis_core::{EntityRecognizer, EntityType, SentenceSplitter, Tagger, Tokenizer};
//!
//! let text = "Can you send me the report by Friday?";
//! let tokens = Tokenizer::new().tokenize(text);
//! let sentences = SentenceSplitter::default().split(text, &tokens);
//! let tags = Tagger::default().tag_all(&sentences, &tokens).unwrap();
//! let entities = EntityRecognizer::default()
//!     .recognize_all(text, &sentences, &tokens, &tags)
//!     .unwrap();
//!
//! assert_eq!(tokens.len(), 9);
//! assert_eq!(sentences.len(), 1);
//! assert_eq!(entities[0].entity_type, EntityType::Date);
//! ```

pub mod error;
pub mod language;
pub mod lemmatizer;
pub mod ner;
pub mod splitter;
pub mod tagger;
pub mod tokenizer;
pub mod types;

pub use error::{CoreError, Result};
pub use language::{LanguageGuess, LanguageIdentifier, LanguageTables};
pub use lemmatizer::Lemmatizer;
pub use ner::{resolve_overlaps, EntityRecognizer};
pub use splitter::SentenceSplitter;
pub use tagger::{SentenceTags, Tagger, DEFAULT_PARALLEL_THRESHOLD};
pub use tokenizer::Tokenizer;
pub use types::{Entity, EntityType, PosTag, Sentence, Span, Token, TokenKind};
