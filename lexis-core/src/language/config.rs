//! Configuration structures and validation
//!
//! This module defines the TOML schema for language tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root language configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub metadata: Metadata,
    pub terminators: Terminators,
    pub enclosures: Enclosures,
    pub abbreviations: Abbreviations,
    #[serde(default)]
    pub sentence_starters: SentenceStarters,
    /// POS tag name -> words carrying that tag
    #[serde(default)]
    pub lexicon: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub gazetteers: Gazetteers,
    #[serde(default)]
    pub stopwords: Stopwords,
    #[serde(default)]
    pub lemmas: Lemmas,
}

/// Language metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub code: String,
    pub name: String,
}

/// Terminator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminators {
    pub chars: Vec<char>,
}

/// Enclosure configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enclosures {
    pub closing: Vec<char>,
}

/// Abbreviation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abbreviations {
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub common: Vec<String>,
}

/// Sentence starters configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentenceStarters {
    /// Categories of sentence starters
    #[serde(flatten)]
    pub categories: HashMap<String, Vec<String>>,
}

/// Gazetteers used by the entity recognizer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Gazetteers {
    #[serde(default)]
    pub first_names: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub organization_suffixes: Vec<String>,
    #[serde(default)]
    pub location_cues: Vec<String>,
    #[serde(default)]
    pub months: Vec<String>,
    #[serde(default)]
    pub month_abbreviations: Vec<String>,
    #[serde(default)]
    pub weekdays: Vec<String>,
    #[serde(default)]
    pub relative_days: Vec<String>,
    #[serde(default)]
    pub currency_symbols: Vec<String>,
    #[serde(default)]
    pub currency_words: Vec<String>,
    #[serde(default)]
    pub time_markers: Vec<String>,
}

/// Function words excluded from filtered token lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stopwords {
    #[serde(default)]
    pub words: Vec<String>,
}

/// Irregular inflection -> lemma, per word class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lemmas {
    #[serde(default)]
    pub verbs: HashMap<String, String>,
    #[serde(default)]
    pub nouns: HashMap<String, String>,
    #[serde(default)]
    pub adjectives: HashMap<String, String>,
}

impl LanguageConfig {
    /// Validate configuration
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.terminators.chars.is_empty() {
            return Err("No terminator characters defined".to_string());
        }

        for tag in self.lexicon.keys() {
            if tag.parse::<crate::types::PosTag>().is_err() {
                return Err(format!("Unknown POS tag '{tag}' in lexicon"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [metadata]
        code = "xx"
        name = "Test"

        [terminators]
        chars = ["."]

        [enclosures]
        closing = []

        [abbreviations]
        titles = ["Dr"]
    "#;

    #[test]
    fn test_minimal_config_parses() {
        let config: LanguageConfig = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.metadata.code, "xx");
        assert!(config.abbreviations.common.is_empty());
        assert!(config.lexicon.is_empty());
        assert!(config.stopwords.words.is_empty());
        assert!(config.lemmas.verbs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_lexicon_tag_rejected() {
        let mut config: LanguageConfig = toml::from_str(MINIMAL).unwrap();
        config
            .lexicon
            .insert("VERBISH".to_string(), vec!["run".to_string()]);
        assert!(config.validate().unwrap_err().contains("VERBISH"));
    }

    #[test]
    fn test_empty_terminators_rejected() {
        let mut config: LanguageConfig = toml::from_str(MINIMAL).unwrap();
        config.terminators.chars.clear();
        assert!(config.validate().is_err());
    }
}
