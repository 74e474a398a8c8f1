//! Lexicon backed lemmatizer
//!
//! Maps each tagged token to its dictionary form. Irregular forms come from
//! the `[lemmas]` tables; regular inflections are stripped by suffix rules,
//! preferring a stem the lexicon knows under the same word class. Unknown
//! words fall back to plain suffix stripping.

use crate::error::{CoreError, Result};
use crate::language::LanguageTables;
use crate::types::{PosTag, Token, TokenKind};
use std::sync::Arc;

/// Rule based lemmatizer
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    tables: Arc<LanguageTables>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new(crate::language::english())
    }
}

impl Lemmatizer {
    /// Create a lemmatizer over the given language tables
    pub fn new(tables: Arc<LanguageTables>) -> Self {
        Self { tables }
    }

    /// Lemma of every token, given one tag per token
    pub fn lemmatize(&self, tokens: &[Token], tags: &[PosTag]) -> Result<Vec<String>> {
        if tokens.len() != tags.len() {
            return Err(CoreError::TokenRangeOutOfBounds {
                start: 0,
                end: tags.len(),
                len: tokens.len(),
            });
        }
        Ok(tokens
            .iter()
            .zip(tags)
            .map(|(token, tag)| self.lemma(token, *tag))
            .collect())
    }

    /// Lemma of a single token
    ///
    /// Proper nouns and non-word tokens keep their surface form; everything
    /// else is lowercased.
    pub fn lemma(&self, token: &Token, tag: PosTag) -> String {
        match token.kind {
            TokenKind::Word => {}
            TokenKind::Clitic => return clitic_lemma(&token.lower(), tag),
            _ => return token.text.clone(),
        }
        if tag == PosTag::Propn {
            return token.text.clone();
        }

        let lower = token.lower();
        match tag {
            PosTag::Verb | PosTag::Aux => self.verb_lemma(&lower),
            PosTag::Noun => self.noun_lemma(&lower),
            PosTag::Adj => self.adjective_lemma(&lower),
            _ => lower,
        }
    }

    fn verb_lemma(&self, lower: &str) -> String {
        let lemmas = self.tables.lemmas();
        if let Some(lemma) = lemmas.verbs.get(lower) {
            return lemma.clone();
        }
        if self.is_verb(lower) {
            return lower.to_string();
        }

        let candidates = if let Some(stem) = lower.strip_suffix("ies") {
            vec![format!("{stem}y")]
        } else if let Some(stem) = lower.strip_suffix("ied") {
            vec![format!("{stem}y")]
        } else if let Some(stem) = lower.strip_suffix("ing") {
            inflection_stems(stem)
        } else if let Some(stem) = lower.strip_suffix("ed") {
            inflection_stems(stem)
        } else if let Some(stem) = lower.strip_suffix("es") {
            vec![stem.to_string(), format!("{stem}e")]
        } else if let Some(stem) = lower
            .strip_suffix('s')
            .filter(|s| !s.ends_with(['s', 'u', 'i']))
        {
            vec![stem.to_string()]
        } else {
            Vec::new()
        };

        pick(lower, candidates, |c| self.is_verb(c))
    }

    fn noun_lemma(&self, lower: &str) -> String {
        if let Some(lemma) = self.tables.lemmas().nouns.get(lower) {
            return lemma.clone();
        }
        if ["ss", "us", "is"].iter().any(|end| lower.ends_with(end)) {
            return lower.to_string();
        }

        let candidates = if let Some(stem) = lower.strip_suffix("ies") {
            vec![format!("{stem}y")]
        } else if let Some(stem) = lower.strip_suffix("es") {
            let sibilant = ["s", "x", "z", "ch", "sh"].iter().any(|end| stem.ends_with(end));
            if sibilant {
                vec![stem.to_string(), format!("{stem}e")]
            } else {
                vec![format!("{stem}e"), stem.to_string()]
            }
        } else if let Some(stem) = lower.strip_suffix('s') {
            vec![stem.to_string()]
        } else {
            Vec::new()
        };

        pick(lower, candidates, |c| self.tables.has_tag(c, PosTag::Noun))
    }

    fn adjective_lemma(&self, lower: &str) -> String {
        if let Some(lemma) = self.tables.lemmas().adjectives.get(lower) {
            return lemma.clone();
        }
        if self.tables.has_tag(lower, PosTag::Adj) {
            return lower.to_string();
        }

        let stems = if let Some(stem) = lower.strip_suffix("iest").or_else(|| lower.strip_suffix("ier")) {
            vec![format!("{stem}y")]
        } else if let Some(stem) = lower.strip_suffix("est").or_else(|| lower.strip_suffix("er")) {
            inflection_stems(stem)
        } else {
            Vec::new()
        };

        // Comparatives are only undone for adjectives the lexicon knows
        stems
            .into_iter()
            .find(|c| self.tables.has_tag(c, PosTag::Adj))
            .unwrap_or_else(|| lower.to_string())
    }

    fn is_verb(&self, lower: &str) -> bool {
        self.tables.has_tag(lower, PosTag::Verb) || self.tables.has_tag(lower, PosTag::Aux)
    }
}

fn clitic_lemma(lower: &str, tag: PosTag) -> String {
    let normalized = lower.replace('’', "'");
    let lemma = match normalized.as_str() {
        "n't" => "not",
        "'m" | "'re" => "be",
        "'s" if tag == PosTag::Aux => "be",
        "'ve" => "have",
        "'ll" => "will",
        "'d" => "would",
        other => other,
    };
    lemma.to_string()
}

/// Stems to try after removing `-ing`, `-ed`, `-er` or `-est`
fn inflection_stems(stem: &str) -> Vec<String> {
    let mut stems = vec![stem.to_string(), format!("{stem}e")];
    let bytes = stem.as_bytes();
    if let [.., a, b] = bytes {
        if a == b && !matches!(a, b'l' | b's' | b'z' | b'f' | b'e' | b'o') {
            stems.push(stem[..stem.len() - 1].to_string());
        }
    }
    stems
}

/// First candidate the lexicon knows, else the first plausible one
fn pick(lower: &str, candidates: Vec<String>, known: impl Fn(&str) -> bool) -> String {
    if let Some(found) = candidates.iter().find(|c| known(c)) {
        return found.clone();
    }
    candidates
        .into_iter()
        .find(|c| is_plausible_stem(c))
        .unwrap_or_else(|| lower.to_string())
}

/// At least three letters with a vowel before any restored final `e`
fn is_plausible_stem(stem: &str) -> bool {
    stem.chars().count() >= 3
        && stem
            .strip_suffix('e')
            .unwrap_or(stem)
            .chars()
            .any(|c| "aeiouy".contains(c))
}
