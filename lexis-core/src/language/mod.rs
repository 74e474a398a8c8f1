//! Language tables for the linguistic stages
//!
//! Abbreviations, sentence starters, the tagging lexicon and the entity
//! gazetteers are data, loaded from TOML and shared read-only.

pub mod config;
pub mod langid;
pub(crate) mod loader;
pub mod tables;

pub use config::LanguageConfig;
pub use langid::{LanguageGuess, LanguageIdentifier};
pub use loader::{english, from_toml_str, get_tables, try_english};
pub use tables::{GazetteerTables, LanguageTables, LemmaTables, PhraseSet, TagSet};
