//! Core types shared by every linguistic stage

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Half-open byte range into the original text
///
/// Offsets always fall on UTF-8 character boundaries of the text the span was
/// produced from, and `start < end` holds for every constructed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Span {
    /// Create a span, rejecting empty or inverted ranges
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start >= end {
            return Err(CoreError::InvalidSpan { start, end });
        }
        Ok(Self { start, end })
    }

    /// Smallest span covering both `self` and `other`
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans are never empty; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether `other` lies entirely within `self`
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice the text this span was produced from
    pub fn slice<'a>(&self, text: &'a str) -> Result<&'a str> {
        for offset in [self.start, self.end] {
            if !text.is_char_boundary(offset) {
                return Err(CoreError::InvalidUtf8Boundary { offset });
            }
        }
        Ok(&text[self.start..self.end])
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Coarse token classification produced by the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Alphabetic word, possibly hyphenated or with an internal apostrophe
    Word,
    /// Numeric literal, including embedded separators (`25,000`, `10:30`)
    Number,
    /// Punctuation mark or run of terminal punctuation
    Punctuation,
    /// Any other symbol (`$`, `&`, emoji, ...)
    Symbol,
    /// Web address
    Url,
    /// E-mail address
    Email,
    /// Dotted acronym (`U.S.A.`, `e.g.`)
    Acronym,
    /// Contraction suffix split from its stem (`n't`, `'m`)
    Clitic,
}

/// A token of the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Location in the original text
    pub span: Span,
    /// Surface text, exactly `span.slice(text)`
    pub text: String,
    /// Tokenizer classification
    pub kind: TokenKind,
}

impl Token {
    /// Create a token from a span of `text`
    pub fn new(text: &str, span: Span, kind: TokenKind) -> Self {
        Self {
            span,
            text: text[span.start..span.end].to_string(),
            kind,
        }
    }

    /// Whether the first character is uppercase
    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }

    /// Whether the first character is lowercase
    pub fn is_lowercase_start(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_lowercase)
    }

    /// Lowercased surface form
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// A sentence: a span plus the contiguous run of tokens it contains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// From the start of the first token to the end of the last
    pub span: Span,
    /// Indices into the document token list
    pub tokens: Range<usize>,
    /// Zero-based paragraph index (paragraphs are separated by blank lines)
    pub paragraph: usize,
}

impl Sentence {
    /// Token indices belonging to this sentence
    pub fn token_indices(&self) -> Range<usize> {
        self.tokens.clone()
    }

    /// Number of tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the sentence holds no tokens (never true for splitter output)
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Borrow this sentence's tokens from the document token list
    pub fn tokens_in<'a>(&self, tokens: &'a [Token]) -> Result<&'a [Token]> {
        tokens
            .get(self.tokens.clone())
            .ok_or(CoreError::TokenRangeOutOfBounds {
                start: self.tokens.start,
                end: self.tokens.end,
                len: tokens.len(),
            })
    }
}

/// Universal part-of-speech tag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    /// Adjective
    Adj,
    /// Adposition
    Adp,
    /// Adverb
    Adv,
    /// Auxiliary verb
    Aux,
    /// Coordinating conjunction
    Cconj,
    /// Determiner
    Det,
    /// Interjection
    Intj,
    /// Common noun
    Noun,
    /// Numeral
    Num,
    /// Particle
    Part,
    /// Pronoun
    Pron,
    /// Proper noun
    Propn,
    /// Punctuation
    Punct,
    /// Subordinating conjunction
    Sconj,
    /// Symbol
    Sym,
    /// Verb
    Verb,
    /// Unknown / other
    X,
}

impl PosTag {
    /// Every tag, in declaration order
    pub const ALL: [PosTag; 17] = [
        PosTag::Adj,
        PosTag::Adp,
        PosTag::Adv,
        PosTag::Aux,
        PosTag::Cconj,
        PosTag::Det,
        PosTag::Intj,
        PosTag::Noun,
        PosTag::Num,
        PosTag::Part,
        PosTag::Pron,
        PosTag::Propn,
        PosTag::Punct,
        PosTag::Sconj,
        PosTag::Sym,
        PosTag::Verb,
        PosTag::X,
    ];

    /// Tag name as used in the language tables and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            PosTag::Adj => "ADJ",
            PosTag::Adp => "ADP",
            PosTag::Adv => "ADV",
            PosTag::Aux => "AUX",
            PosTag::Cconj => "CCONJ",
            PosTag::Det => "DET",
            PosTag::Intj => "INTJ",
            PosTag::Noun => "NOUN",
            PosTag::Num => "NUM",
            PosTag::Part => "PART",
            PosTag::Pron => "PRON",
            PosTag::Propn => "PROPN",
            PosTag::Punct => "PUNCT",
            PosTag::Sconj => "SCONJ",
            PosTag::Sym => "SYM",
            PosTag::Verb => "VERB",
            PosTag::X => "X",
        }
    }

    /// Open-class content word (noun, verb, adjective, adverb)
    pub fn is_content(&self) -> bool {
        matches!(
            self,
            PosTag::Noun | PosTag::Propn | PosTag::Verb | PosTag::Adj | PosTag::Adv
        )
    }

    /// Nominal head (noun, proper noun, pronoun)
    pub fn is_nominal(&self) -> bool {
        matches!(self, PosTag::Noun | PosTag::Propn | PosTag::Pron)
    }
}

impl fmt::Display for PosTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PosTag {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        PosTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CoreError::LanguageConfig(format!("unknown POS tag '{s}'")))
    }
}

/// Named entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    /// People and fictional characters
    Person,
    /// Companies, institutions, agencies
    Organization,
    /// Countries, cities, regions
    Location,
    /// Absolute or relative dates
    Date,
    /// Times of day
    Time,
    /// Monetary amounts
    Money,
    /// Percentages
    Percent,
    /// E-mail addresses
    Email,
    /// Web addresses
    Url,
    /// Proper names of unknown type
    Misc,
}

impl EntityType {
    /// Label used in serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORGANIZATION",
            EntityType::Location => "LOCATION",
            EntityType::Date => "DATE",
            EntityType::Time => "TIME",
            EntityType::Money => "MONEY",
            EntityType::Percent => "PERCENT",
            EntityType::Email => "EMAIL",
            EntityType::Url => "URL",
            EntityType::Misc => "MISC",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named entity aligned to token boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// From the start of the first token to the end of the last
    pub span: Span,
    /// Indices into the document token list
    pub tokens: Range<usize>,
    /// Entity type
    pub entity_type: EntityType,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Surface text
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_rejects_empty() {
        assert!(Span::new(3, 3).is_err());
        assert!(Span::new(4, 3).is_err());
        assert_eq!(Span::new(0, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_span_relations() {
        let outer = Span::new(0, 10).unwrap();
        let inner = Span::new(2, 5).unwrap();
        let disjoint = Span::new(10, 12).unwrap();

        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.overlaps(&inner));
        assert!(!outer.overlaps(&disjoint));
        assert_eq!(inner.cover(&disjoint), Span::new(2, 12).unwrap());
    }

    #[test]
    fn test_span_slice_checks_boundaries() {
        let text = "日本";
        assert_eq!(Span::new(0, 3).unwrap().slice(text).unwrap(), "日");
        assert_eq!(
            Span::new(1, 3).unwrap().slice(text),
            Err(CoreError::InvalidUtf8Boundary { offset: 1 })
        );
    }

    #[test]
    fn test_pos_tag_round_trip_names() {
        for tag in PosTag::ALL {
            assert_eq!(tag.as_str().parse::<PosTag>().unwrap(), tag);
        }
        assert!("ADVERB".parse::<PosTag>().is_err());
    }
}
