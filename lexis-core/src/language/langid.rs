//! Language identification against the loaded language tables
//!
//! A document is scored by the share of its words found in the tables'
//! lexicon, stopwords or irregular forms. Ordinary prose in the table's
//! language sits well above [`FULL_CONFIDENCE_RATIO`]; text in another
//! language rarely matches more than a few loanwords.

use crate::language::LanguageTables;
use crate::types::{Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Code reported when no language reaches [`MIN_PROBABILITY`]
pub const UNDETERMINED: &str = "und";

/// Known-word ratio mapped to probability 1.0
pub const FULL_CONFIDENCE_RATIO: f32 = 0.35;

/// Probability below which the language is reported as undetermined
pub const MIN_PROBABILITY: f32 = 0.5;

/// Identified language and its probability in `[0, 1]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageGuess {
    /// Language code, or `und`
    pub code: String,
    /// Probability of `code`
    pub probability: f32,
}

impl LanguageGuess {
    /// Guess for text with nothing to go on
    pub fn undetermined() -> Self {
        Self {
            code: UNDETERMINED.to_string(),
            probability: 0.0,
        }
    }

    /// Whether a language was identified
    pub fn is_determined(&self) -> bool {
        self.code != UNDETERMINED
    }
}

/// Word-list based language identifier
#[derive(Debug, Clone)]
pub struct LanguageIdentifier {
    tables: Arc<LanguageTables>,
}

impl Default for LanguageIdentifier {
    fn default() -> Self {
        Self::new(crate::language::english())
    }
}

impl LanguageIdentifier {
    /// Create an identifier for the language of `tables`
    pub fn new(tables: Arc<LanguageTables>) -> Self {
        Self { tables }
    }

    /// Display name of the language this identifier recognizes
    pub fn language_name(&self) -> &str {
        self.tables.name()
    }

    /// Identify the language of a tokenized text
    pub fn identify(&self, tokens: &[Token]) -> LanguageGuess {
        let mut words = 0usize;
        let mut known = 0usize;
        for token in tokens.iter().filter(|t| t.kind == TokenKind::Word) {
            words += 1;
            known += usize::from(self.tables.is_known_word(&token.lower()));
        }
        if words == 0 {
            return LanguageGuess::undetermined();
        }

        let ratio = known as f32 / words as f32;
        let probability = (ratio / FULL_CONFIDENCE_RATIO).min(1.0);
        if probability < MIN_PROBABILITY {
            return LanguageGuess {
                code: UNDETERMINED.to_string(),
                probability: 1.0 - probability,
            };
        }
        LanguageGuess {
            code: self.tables.code().to_string(),
            probability,
        }
    }
}
