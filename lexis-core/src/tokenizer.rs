//! Rule-based tokenizer
//!
//! Splits text into tokens on whitespace and punctuation, keeping URLs,
//! e-mail addresses, dotted acronyms, numbers with embedded separators and
//! hyphenated words intact, and splitting contractions Penn-Treebank style.
//!
//! The tokenizer is total: every non-whitespace character ends up in exactly
//! one token, and token texts are exact slices of the input, so the text can
//! always be rebuilt from the tokens and the whitespace between them.

use crate::types::{Span, Token, TokenKind};
use regex::Regex;
use smallvec::{smallvec, SmallVec};
use std::sync::OnceLock;

/// Compiled token patterns, tried in order at each position
struct Patterns {
    url: Regex,
    email: Regex,
    acronym: Regex,
    number: Regex,
    word: Regex,
    terminal_run: Regex,
    dash_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("tokenizer patterns are valid");
        Patterns {
            url: compile(r#"(?i)^(?:(?:https?|ftp)://|www\.)[^\s<>"]+"#),
            email: compile(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}"),
            acronym: compile(r"^\p{L}(?:\.\p{L})+(?:\.|\b)"),
            number: compile(r"^\d+(?:[.,:/\-]\d+)*(?:(?:st|nd|rd|th)\b|%)?"),
            word: compile(r"^[\p{L}\p{M}\p{N}_]+(?:[-'’][\p{L}\p{M}\p{N}_]+)*"),
            terminal_run: compile(r"^(?:[.!?]+|…+)"),
            dash_run: compile(r"^-{2,}"),
        }
    })
}

/// Characters a URL may match but that belong to the surrounding sentence
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '}', '\'', '"'];

/// Contraction suffixes split from the stem (apostrophes normalized to `'`)
const CLITICS: &[&str] = &["'s", "'m", "'re", "'ve", "'ll", "'d"];

/// Deterministic, total tokenizer
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer;

impl Tokenizer {
    /// Create a tokenizer
    pub fn new() -> Self {
        Self
    }

    /// Tokenize `text` into an ordered token sequence
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::with_capacity(text.len() / 4);
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];
            let Some(ch) = rest.chars().next() else {
                break;
            };
            if ch.is_whitespace() {
                pos += ch.len_utf8();
                continue;
            }

            let (len, kind) = Self::match_at(rest, ch);
            let piece = Span { start: pos, end: pos + len };
            for (span, kind) in Self::split_clitic(text, piece, kind) {
                tokens.push(Token::new(text, span, kind));
            }
            pos += len;
        }

        tokens
    }

    /// Longest token starting at the beginning of `rest`, in bytes
    fn match_at(rest: &str, first: char) -> (usize, TokenKind) {
        let p = patterns();

        if let Some(m) = p.url.find(rest) {
            let trimmed = m.as_str().trim_end_matches(URL_TRAILING);
            if trimmed.len() > "www.".len() {
                return (trimmed.len(), TokenKind::Url);
            }
        }
        if let Some(m) = p.email.find(rest) {
            return (m.end(), TokenKind::Email);
        }
        if let Some(m) = p.acronym.find(rest) {
            return (m.end(), TokenKind::Acronym);
        }
        if let Some(m) = p.number.find(rest) {
            return (m.end(), TokenKind::Number);
        }
        if let Some(m) = p.word.find(rest) {
            return (m.end(), TokenKind::Word);
        }
        if let Some(m) = p.terminal_run.find(rest) {
            return (m.end(), TokenKind::Punctuation);
        }
        if let Some(m) = p.dash_run.find(rest) {
            return (m.end(), TokenKind::Punctuation);
        }

        (first.len_utf8(), classify_char(first))
    }

    /// Split a trailing contraction off a word token
    fn split_clitic(
        text: &str,
        span: Span,
        kind: TokenKind,
    ) -> SmallVec<[(Span, TokenKind); 2]> {
        if kind != TokenKind::Word {
            return smallvec![(span, kind)];
        }
        let word = &text[span.start..span.end];

        match clitic_offset(word) {
            Some(offset) if offset > 0 && offset < word.len() => smallvec![
                (Span { start: span.start, end: span.start + offset }, TokenKind::Word),
                (Span { start: span.start + offset, end: span.end }, TokenKind::Clitic),
            ],
            _ => smallvec![(span, kind)],
        }
    }

    /// Rebuild the original text from its tokens, filling gaps from `text`
    ///
    /// Returns `None` if a gap between tokens contains anything but
    /// whitespace, which would mean the tokens do not come from `text`.
    pub fn reconstruct(text: &str, tokens: &[Token]) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for token in tokens {
            let gap = text.get(cursor..token.span.start)?;
            if !gap.chars().all(char::is_whitespace) {
                return None;
            }
            out.push_str(gap);
            out.push_str(&token.text);
            cursor = token.span.end;
        }

        let tail = text.get(cursor..)?;
        if !tail.chars().all(char::is_whitespace) {
            return None;
        }
        out.push_str(tail);
        Some(out)
    }

    /// Join tokens into readable text without the original spacing
    ///
    /// Punctuation and clitics attach to the preceding token and opening
    /// brackets attach to the following one.
    pub fn detokenize(tokens: &[Token]) -> String {
        let mut out = String::new();
        let mut glue_next = true;

        for token in tokens {
            let attaches_left = token.kind == TokenKind::Clitic
                || (token.kind == TokenKind::Punctuation
                    && matches!(
                        token.text.chars().next(),
                        Some('.' | ',' | ';' | ':' | '!' | '?' | ')' | ']' | '}' | '…' | '”' | '’')
                    ));
            if !glue_next && !attaches_left {
                out.push(' ');
            }
            out.push_str(&token.text);
            glue_next = matches!(token.text.as_str(), "(" | "[" | "{" | "“" | "‘" | "$");
        }

        out
    }
}

/// Byte offset at which a contraction suffix starts, if the word has one
fn clitic_offset(word: &str) -> Option<usize> {
    let normalized = word.replace('’', "'").to_lowercase();

    // n't binds to the negated auxiliary: do|n't, ca|n't
    if normalized.len() > 3 && normalized.ends_with("n't") {
        let apostrophe = word.rfind(['\'', '’'])?;
        let n_pos = word[..apostrophe].rfind(['n', 'N'])?;
        return (n_pos + 1 == apostrophe).then_some(n_pos);
    }

    let apostrophe = word.rfind(['\'', '’'])?;
    let suffix = word[apostrophe..].replace('’', "'").to_lowercase();
    CLITICS.contains(&suffix.as_str()).then_some(apostrophe)
}

fn classify_char(ch: char) -> TokenKind {
    if ch.is_alphabetic() {
        TokenKind::Word
    } else if ch.is_numeric() {
        TokenKind::Number
    } else if is_punctuation(ch) {
        TokenKind::Punctuation
    } else {
        TokenKind::Symbol
    }
}

fn is_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | ','
            | ';'
            | ':'
            | '!'
            | '?'
            | '\''
            | '"'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '-'
            | '/'
            | '\\'
            | '“'
            | '”'
            | '‘'
            | '’'
            | '«'
            | '»'
            | '–'
            | '—'
            | '…'
            | '¿'
            | '¡'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        Tokenizer::new()
            .tokenize(input)
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(Tokenizer::new().tokenize("").is_empty());
        assert!(Tokenizer::new().tokenize(" \n\t ").is_empty());
    }

    #[test]
    fn test_basic_sentence() {
        assert_eq!(
            texts("Hello, world! How are you?"),
            ["Hello", ",", "world", "!", "How", "are", "you", "?"]
        );
    }

    #[test]
    fn test_contractions_split() {
        assert_eq!(texts("I'm sure"), ["I", "'m", "sure"]);
        assert_eq!(texts("don't"), ["do", "n't"]);
        assert_eq!(texts("can't won’t"), ["ca", "n't", "wo", "n’t"]);
        assert_eq!(texts("John's car"), ["John", "'s", "car"]);
        assert_eq!(texts("they'll"), ["they", "'ll"]);
    }

    #[test]
    fn test_apostrophe_words_not_split() {
        assert_eq!(texts("O'Brien"), ["O'Brien"]);
        assert_eq!(texts("rock'n'roll"), ["rock'n'roll"]);
    }

    #[test]
    fn test_clitic_kind() {
        let tokens = Tokenizer::new().tokenize("isn't");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].kind, TokenKind::Clitic);
    }

    #[test]
    fn test_hyphenated_words() {
        assert_eq!(texts("a state-of-the-art tool"), ["a", "state-of-the-art", "tool"]);
        assert_eq!(texts("wait -- what"), ["wait", "--", "what"]);
    }

    #[test]
    fn test_urls_and_emails() {
        let tokens = Tokenizer::new().tokenize("See https://example.com/a?b=1. Mail me@example.org!");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.text.as_str(), t.kind)).collect();
        assert_eq!(
            kinds,
            [
                ("See", TokenKind::Word),
                ("https://example.com/a?b=1", TokenKind::Url),
                (".", TokenKind::Punctuation),
                ("Mail", TokenKind::Word),
                ("me@example.org", TokenKind::Email),
                ("!", TokenKind::Punctuation),
            ]
        );
        assert_eq!(texts("visit www.rust-lang.org."), ["visit", "www.rust-lang.org", "."]);
    }

    #[test]
    fn test_numbers_with_punctuation() {
        assert_eq!(
            texts("It cost $25,000 at 10:30 on 12/25/2024, 3.14 and 50%."),
            [
                "It", "cost", "$", "25,000", "at", "10:30", "on", "12/25/2024", ",", "3.14",
                "and", "50%", "."
            ]
        );
        assert_eq!(texts("the 1st of May"), ["the", "1st", "of", "May"]);
        assert_eq!(texts("2024-03-05"), ["2024-03-05"]);
    }

    #[test]
    fn test_acronyms() {
        let tokens = Tokenizer::new().tokenize("the U.S.A. and e.g. this");
        assert_eq!(tokens[1].text, "U.S.A.");
        assert_eq!(tokens[1].kind, TokenKind::Acronym);
        assert_eq!(tokens[3].text, "e.g.");
        assert_eq!(texts("end.The"), ["end", ".", "The"]);
    }

    #[test]
    fn test_terminal_runs() {
        assert_eq!(texts("What?! Wait..."), ["What", "?!", "Wait", "..."]);
    }

    #[test]
    fn test_offsets_and_unicode() {
        let text = "Café “naïve” 日本語 🎉";
        let tokens = Tokenizer::new().tokenize(text);
        for token in &tokens {
            assert_eq!(&text[token.span.start..token.span.end], token.text);
        }
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Symbol);
        assert_eq!(tokens[1].text, "“");
    }

    #[test]
    fn test_reconstruct_round_trip() {
        let text = "  Dr. Smith   said:\n\"Don't go!\"\t";
        let tokens = Tokenizer::new().tokenize(text);
        assert_eq!(Tokenizer::reconstruct(text, &tokens).unwrap(), text);
    }

    #[test]
    fn test_detokenize() {
        let tokens = Tokenizer::new().tokenize("I'm  here ( really ) , ok ?");
        assert_eq!(Tokenizer::detokenize(&tokens), "I'm here (really), ok?");
    }
}
