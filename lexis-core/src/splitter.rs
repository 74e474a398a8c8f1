//! Sentence splitter
//!
//! Groups tokens into sentences. A sentence ends after terminal punctuation
//! unless the period belongs to an abbreviation or an initial, or the next
//! word starts in lowercase. Closing quotes and brackets glued to the
//! terminator stay with the sentence they close, and a blank line always
//! ends a sentence and starts a new paragraph.

use crate::language::LanguageTables;
use crate::types::{Span, Sentence, Token, TokenKind};
use std::sync::Arc;

/// Boundary-aware sentence splitter
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    tables: Arc<LanguageTables>,
}

impl Default for SentenceSplitter {
    fn default() -> Self {
        Self::new(crate::language::english())
    }
}

impl SentenceSplitter {
    /// Create a splitter over the given language tables
    pub fn new(tables: Arc<LanguageTables>) -> Self {
        Self { tables }
    }

    /// Split `tokens` (produced from `text`) into sentences
    ///
    /// Sentences are contiguous, non-overlapping, and together cover every
    /// token. Empty token input yields no sentences.
    pub fn split(&self, text: &str, tokens: &[Token]) -> Vec<Sentence> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut paragraph = 0;
        let mut i = 0;

        while i < tokens.len() {
            let mut end = i + 1;
            let mut close = self.ends_sentence(tokens, i);

            if close {
                // Absorb closing quotes/brackets glued to the terminator
                while end < tokens.len()
                    && tokens[end].span.start == tokens[end - 1].span.end
                    && self.tables.is_closing_token(&tokens[end].text)
                {
                    end += 1;
                }
                if self.continues_lowercase(tokens, end) {
                    close = false;
                }
            }

            let blank_line_follows = end < tokens.len()
                && is_paragraph_break(&text[tokens[end - 1].span.end..tokens[end].span.start]);

            if close || blank_line_follows || end == tokens.len() {
                sentences.push(Self::make_sentence(tokens, start, end, paragraph));
                start = end;
                if blank_line_follows {
                    paragraph += 1;
                }
            }
            i = end;
        }

        log::trace!("Split {} tokens into {} sentences", tokens.len(), sentences.len());
        sentences
    }

    /// One sentence per caller-provided segment, skipping empty segments
    ///
    /// Used when the text was assembled from already split sentences. A token
    /// belongs to the first segment ending after its start; tokens past the
    /// last segment join the final sentence.
    pub fn split_segments(&self, tokens: &[Token], segments: &[Span]) -> Vec<Sentence> {
        let mut sentences: Vec<Sentence> = Vec::with_capacity(segments.len());
        let mut start = 0;

        for segment in segments {
            let mut end = start;
            while end < tokens.len() && tokens[end].span.start < segment.end {
                end += 1;
            }
            if end > start {
                sentences.push(Self::make_sentence(tokens, start, end, 0));
                start = end;
            }
        }
        if start < tokens.len() {
            let first = sentences.pop().map_or(start, |last| last.tokens.start);
            sentences.push(Self::make_sentence(tokens, first, tokens.len(), 0));
        }

        log::trace!("Kept {} pre-split sentences", sentences.len());
        sentences
    }

    fn make_sentence(tokens: &[Token], start: usize, end: usize, paragraph: usize) -> Sentence {
        Sentence {
            span: tokens[start].span.cover(&tokens[end - 1].span),
            tokens: start..end,
            paragraph,
        }
    }

    /// Whether token `i` can end a sentence, ignoring what follows the
    /// closing quotes
    fn ends_sentence(&self, tokens: &[Token], i: usize) -> bool {
        let token = &tokens[i];

        if token.kind == TokenKind::Acronym {
            // "U.S.A." ends a sentence only before a known sentence starter
            return token.text.ends_with('.') && self.next_is_starter(tokens, i + 1);
        }

        if token.kind != TokenKind::Punctuation || !self.tables.is_terminator_token(&token.text) {
            return false;
        }

        if token.text == "." && i > 0 {
            let prev = &tokens[i - 1];
            let glued = prev.span.end == token.span.start;
            if glued && prev.kind == TokenKind::Word {
                if self.tables.is_title(&prev.text) {
                    return false;
                }
                if is_initial(&prev.text) || self.tables.is_abbreviation(&prev.text) {
                    return self.next_is_starter(tokens, i + 1) || i + 1 == tokens.len();
                }
            }
        }

        true
    }

    fn next_is_starter(&self, tokens: &[Token], next: usize) -> bool {
        tokens
            .get(next)
            .is_some_and(|t| t.is_capitalized() && self.tables.is_sentence_starter(&t.text))
    }

    /// Heuristic continuation: the next word starts with a lowercase letter
    fn continues_lowercase(&self, tokens: &[Token], next: usize) -> bool {
        tokens
            .get(next)
            .is_some_and(|t| t.kind == TokenKind::Word && t.is_lowercase_start())
    }
}

/// Single uppercase letter other than the pronoun, as in "J. K. Rowling"
fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase() && c != 'I')
}

/// Gap between two tokens holding at least two line breaks
fn is_paragraph_break(gap: &str) -> bool {
    gap.matches('\n').count() >= 2
}

/// Whether `sentences` exactly partition `tokens` (test and debug helper)
pub fn covers_all_tokens(sentences: &[Sentence], tokens: &[Token]) -> bool {
    let mut expected = 0;
    for sentence in sentences {
        if sentence.tokens.start != expected || sentence.tokens.is_empty() {
            return false;
        }
        let first = &tokens[sentence.tokens.start];
        let last = &tokens[sentence.tokens.end - 1];
        if sentence.span != (Span { start: first.span.start, end: last.span.end }) {
            return false;
        }
        expected = sentence.tokens.end;
    }
    expected == tokens.len()
}
