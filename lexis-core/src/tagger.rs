//! Part-of-speech tagger
//!
//! A lexicon and rule based tagger over the Universal POS tag set. Tagging is
//! stateless per sentence: three passes over the sentence's tokens
//!
//! 1. candidate tags from token kind, lexicon, capitalization and suffixes
//! 2. left-to-right disambiguation of words with several lexicon tags
//! 3. contextual repairs (determiner + verb-like word, subject + unknown word)
//!
//! Every token receives exactly one tag. Words with no evidence at all fall
//! back to NOUN and are counted as guessed.

use crate::error::Result;
use crate::language::{LanguageTables, TagSet};
use crate::types::{PosTag, Sentence, Token, TokenKind};
use smallvec::smallvec;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default number of sentences above which tagging runs in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 32;

const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "we", "they", "it"];

/// Tags for one sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTags {
    first_token: usize,
    tags: Vec<PosTag>,
    guessed: usize,
}

impl SentenceTags {
    /// Tags in sentence token order
    pub fn tags(&self) -> &[PosTag] {
        &self.tags
    }

    /// `(document token index, tag)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, PosTag)> + '_ {
        self.tags
            .iter()
            .enumerate()
            .map(move |(offset, tag)| (self.first_token + offset, *tag))
    }

    /// Tag of a document token index, if it belongs to this sentence
    pub fn get(&self, token_index: usize) -> Option<PosTag> {
        token_index
            .checked_sub(self.first_token)
            .and_then(|offset| self.tags.get(offset))
            .copied()
    }

    /// Number of tagged tokens
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the sentence had no tokens
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tokens tagged by the no-evidence fallback
    pub fn guessed(&self) -> usize {
        self.guessed
    }

    /// Share of tokens tagged by the fallback
    pub fn guessed_ratio(&self) -> f32 {
        if self.tags.is_empty() {
            0.0
        } else {
            self.guessed as f32 / self.tags.len() as f32
        }
    }
}

/// Lexicon and rule based POS tagger
#[derive(Debug, Clone)]
pub struct Tagger {
    tables: Arc<LanguageTables>,
    parallel_threshold: usize,
}

impl Default for Tagger {
    fn default() -> Self {
        Self::new(crate::language::english())
    }
}

impl Tagger {
    /// Create a tagger over the given language tables
    pub fn new(tables: Arc<LanguageTables>) -> Self {
        Self {
            tables,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the sentence count above which `tag_all` runs in parallel
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Tag one sentence of the document
    ///
    /// Fails only if the sentence's token range does not fit `tokens`.
    pub fn tag(&self, sentence: &Sentence, tokens: &[Token]) -> Result<SentenceTags> {
        let sentence_tokens = sentence.tokens_in(tokens)?;
        let (tags, guessed) = self.tag_sequence(sentence_tokens);
        Ok(SentenceTags {
            first_token: sentence.tokens.start,
            tags,
            guessed,
        })
    }

    /// Tag every sentence, in parallel for long documents
    pub fn tag_all(&self, sentences: &[Sentence], tokens: &[Token]) -> Result<Vec<SentenceTags>> {
        #[cfg(feature = "parallel")]
        if sentences.len() > self.parallel_threshold {
            return sentences
                .par_iter()
                .map(|sentence| self.tag(sentence, tokens))
                .collect();
        }

        sentences
            .iter()
            .map(|sentence| self.tag(sentence, tokens))
            .collect()
    }

    /// Tag an arbitrary token sequence treated as a single sentence
    pub fn tag_tokens(&self, tokens: &[Token]) -> Vec<PosTag> {
        self.tag_sequence(tokens).0
    }

    fn tag_sequence(&self, tokens: &[Token]) -> (Vec<PosTag>, usize) {
        let lowers: Vec<String> = tokens.iter().map(Token::lower).collect();

        let mut candidates = Vec::with_capacity(tokens.len());
        let mut guessed = 0;
        for i in 0..tokens.len() {
            let (cands, was_guessed) = self.candidates(tokens, &lowers, i);
            guessed += usize::from(was_guessed);
            candidates.push(cands);
        }

        let mut tags: Vec<PosTag> = Vec::with_capacity(tokens.len());
        for i in 0..tokens.len() {
            let tag = self.resolve(&lowers, &candidates, &tags, i);
            tags.push(tag);
        }

        self.repair(tokens, &lowers, &mut tags);
        (tags, guessed)
    }

    /// First pass: candidate tags for token `i` and whether they were guessed
    fn candidates(&self, tokens: &[Token], lowers: &[String], i: usize) -> (TagSet, bool) {
        let token = &tokens[i];
        let lower = lowers[i].as_str();

        match token.kind {
            TokenKind::Number => return (smallvec![PosTag::Num], false),
            TokenKind::Punctuation => return (smallvec![PosTag::Punct], false),
            TokenKind::Symbol => return (smallvec![PosTag::Sym], false),
            TokenKind::Url | TokenKind::Email => return (smallvec![PosTag::X], false),
            TokenKind::Acronym => {
                let tag = match lower {
                    "e.g." | "i.e." | "e.g" | "i.e" => PosTag::Adv,
                    "a.m." | "p.m." => PosTag::Noun,
                    _ => PosTag::Propn,
                };
                return (smallvec![tag], false);
            }
            TokenKind::Clitic => {
                let normalized = lower.replace('’', "'");
                let tag = match normalized.as_str() {
                    "n't" | "'s" => PosTag::Part,
                    _ => PosTag::Aux,
                };
                return (smallvec![tag], false);
            }
            TokenKind::Word => {}
        }

        if !token.text.chars().any(char::is_alphabetic) {
            let tag = if token.text.chars().any(char::is_numeric) {
                PosTag::Num
            } else {
                PosTag::X
            };
            return (smallvec![tag], false);
        }

        let initial = is_sentence_initial(tokens, i);
        let known = self.tables.lexicon_tags(lower);

        if token.is_capitalized() && !initial && !known.contains(&PosTag::Pron) {
            return (smallvec![PosTag::Propn], false);
        }
        if !known.is_empty() {
            return (known.iter().copied().collect(), false);
        }
        if is_all_caps(&token.text) {
            return (smallvec![PosTag::Propn], false);
        }
        if token.is_capitalized() && self.in_name_gazetteer(lower) {
            return (smallvec![PosTag::Propn], false);
        }
        if let Some(tag) = self.suffix_tag(lower) {
            return (smallvec![tag], false);
        }

        (smallvec![PosTag::Noun], true)
    }

    fn in_name_gazetteer(&self, lower: &str) -> bool {
        let g = self.tables.gazetteers();
        g.first_names.contains(lower)
            || g.weekdays.contains(lower)
            || g.months.contains(lower)
            || g.locations.contains_word(lower)
            || g.organizations.contains_word(lower)
    }

    /// Open-class guess from the word's ending
    fn suffix_tag(&self, lower: &str) -> Option<PosTag> {
        let len = lower.chars().count();
        if len <= 3 {
            return None;
        }

        // Inflected forms of known words: reports, sends, fixes
        for suffix in ["es", "s"] {
            if let Some(stem) = lower.strip_suffix(suffix) {
                if self.tables.has_tag(stem, PosTag::Noun) {
                    return Some(PosTag::Noun);
                }
                if self.tables.has_tag(stem, PosTag::Verb) {
                    return Some(PosTag::Verb);
                }
            }
        }

        const ADVERB: &[&str] = &["ly"];
        const VERB: &[&str] = &["ing", "ed", "ize", "ise", "ify", "ate"];
        const NOUN: &[&str] = &[
            "tion", "sion", "ment", "ness", "ity", "ship", "ism", "ist", "ance", "ence",
            "hood", "dom", "er", "or", "age", "ure",
        ];
        const ADJECTIVE: &[&str] = &[
            "ous", "ful", "ive", "able", "ible", "al", "ic", "less", "ish", "ary", "est",
        ];

        let ends = |suffixes: &[&str]| suffixes.iter().any(|s| lower.ends_with(s));
        if ends(ADVERB) && len > 4 {
            Some(PosTag::Adv)
        } else if ends(VERB) {
            Some(PosTag::Verb)
        } else if ends(NOUN) {
            Some(PosTag::Noun)
        } else if ends(ADJECTIVE) {
            Some(PosTag::Adj)
        } else if lower.ends_with('s') && !lower.ends_with("ss") {
            Some(PosTag::Noun)
        } else {
            None
        }
    }

    /// Second pass: pick one tag for ambiguous lexicon words
    fn resolve(&self, lowers: &[String], candidates: &[TagSet], tags: &[PosTag], i: usize) -> PosTag {
        let cands = &candidates[i];
        if cands.len() == 1 {
            return cands[0];
        }

        let lower = lowers[i].as_str();
        let prev = i.checked_sub(1).map(|p| tags[p]);
        let next = candidates.get(i + 1).map(|c| c.as_slice()).unwrap_or(&[]);
        let next_has = |tag: PosTag| next.contains(&tag);
        let has = |tag: PosTag| cands.contains(&tag);

        if has(PosTag::Aux) && has(PosTag::Verb) {
            let inverted = prev.is_none() && (next_has(PosTag::Pron) || next_has(PosTag::Det));
            let before_verb = next_has(PosTag::Verb)
                || next_has(PosTag::Part)
                || next_has(PosTag::Adv)
                || lowers
                    .get(i + 1)
                    .is_some_and(|w| w.ends_with("ed") || w.ends_with("ing"));
            return if inverted || before_verb {
                PosTag::Aux
            } else {
                PosTag::Verb
            };
        }

        if has(PosTag::Det) && has(PosTag::Sconj) {
            return if matches!(prev, Some(PosTag::Verb | PosTag::Adj)) {
                PosTag::Sconj
            } else {
                PosTag::Det
            };
        }

        if has(PosTag::Adp) && has(PosTag::Sconj) {
            return if next_has(PosTag::Pron) || (next_has(PosTag::Det) && lower == "as") {
                PosTag::Sconj
            } else {
                PosTag::Adp
            };
        }

        if has(PosTag::Adp) && has(PosTag::Verb) {
            let after_subject = matches!(
                prev,
                Some(PosTag::Pron | PosTag::Noun | PosTag::Propn | PosTag::Aux | PosTag::Part)
            );
            return if after_subject {
                PosTag::Verb
            } else {
                PosTag::Adp
            };
        }

        if has(PosTag::Cconj) && has(PosTag::Adv) {
            return if next_has(PosTag::Adj) || next_has(PosTag::Adv) {
                PosTag::Adv
            } else {
                PosTag::Cconj
            };
        }

        if has(PosTag::Intj) && has(PosTag::Det) {
            return if prev.is_none() && (next.is_empty() || next_has(PosTag::Punct)) {
                PosTag::Intj
            } else {
                PosTag::Det
            };
        }

        if has(PosTag::Noun) && has(PosTag::Verb) {
            return match prev {
                None | Some(PosTag::Aux | PosTag::Part | PosTag::Intj | PosTag::Cconj) => {
                    PosTag::Verb
                }
                Some(PosTag::Pron) if SUBJECT_PRONOUNS.contains(&lowers[i - 1].as_str()) => {
                    PosTag::Verb
                }
                _ => PosTag::Noun,
            };
        }

        if has(PosTag::Adj) && has(PosTag::Verb) {
            return if matches!(prev, Some(PosTag::Aux | PosTag::Part | PosTag::Pron)) {
                PosTag::Verb
            } else {
                PosTag::Adj
            };
        }

        // Fixed preference for the remaining combinations
        const PREFERENCE: [PosTag; 17] = [
            PosTag::Aux,
            PosTag::Part,
            PosTag::Pron,
            PosTag::Det,
            PosTag::Adp,
            PosTag::Cconj,
            PosTag::Sconj,
            PosTag::Verb,
            PosTag::Noun,
            PosTag::Adj,
            PosTag::Adv,
            PosTag::Intj,
            PosTag::Propn,
            PosTag::Num,
            PosTag::Punct,
            PosTag::Sym,
            PosTag::X,
        ];
        PREFERENCE
            .into_iter()
            .find(|tag| has(*tag))
            .unwrap_or(PosTag::X)
    }

    /// Third pass: contextual repairs
    fn repair(&self, tokens: &[Token], lowers: &[String], tags: &mut [PosTag]) {
        for i in 0..tags.len() {
            let lower = lowers[i].as_str();
            let prev = i.checked_sub(1).map(|p| tags[p]);

            // to + verb is an infinitive marker, otherwise a preposition
            if lower == "to" {
                let verb_follows = lowers.get(i + 1).is_some_and(|w| {
                    self.tables.has_tag(w, PosTag::Verb) || self.tables.has_tag(w, PosTag::Aux)
                });
                tags[i] = if verb_follows { PosTag::Part } else { PosTag::Adp };
                continue;
            }

            // 's after a pronoun is "is"/"has", otherwise possessive
            if tokens[i].kind == TokenKind::Clitic && lower.replace('’', "'") == "'s" {
                tags[i] = if prev == Some(PosTag::Pron) { PosTag::Aux } else { PosTag::Part };
                continue;
            }

            match (prev, tags[i]) {
                // the booking, a failed attempt
                (Some(PosTag::Det | PosTag::Adj), PosTag::Verb) if lower.ends_with("ing") => {
                    tags[i] = PosTag::Noun;
                }
                (Some(PosTag::Det), PosTag::Verb) if lower.ends_with("ed") => {
                    tags[i] = PosTag::Adj;
                }
                // to/modal + known verb used as a noun elsewhere
                (Some(PosTag::Part | PosTag::Aux), PosTag::Noun)
                    if self.tables.has_tag(lower, PosTag::Verb) =>
                {
                    tags[i] = PosTag::Verb;
                }
                // subject pronoun + word with no evidence
                (Some(PosTag::Pron), PosTag::Noun)
                    if i > 0
                        && SUBJECT_PRONOUNS.contains(&lowers[i - 1].as_str())
                        && self.tables.lexicon_tags(lower).is_empty()
                        && !tokens[i].is_capitalized() =>
                {
                    tags[i] = PosTag::Verb;
                }
                _ => {}
            }
        }
    }
}

/// No word precedes `i` in the sentence, or it follows an opening quote or colon
fn is_sentence_initial(tokens: &[Token], i: usize) -> bool {
    match i.checked_sub(1).map(|p| &tokens[p]) {
        None => true,
        Some(prev) => {
            matches!(prev.text.as_str(), "\"" | "“" | "‘" | "'" | "(" | ":" | "-" | "--" | "—")
                || tokens[..i].iter().all(|t| {
                    matches!(t.kind, TokenKind::Punctuation | TokenKind::Symbol)
                })
        }
    }
}

fn is_all_caps(word: &str) -> bool {
    word.chars().filter(|c| c.is_alphabetic()).count() >= 2
        && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::SentenceSplitter;
    use crate::tokenizer::Tokenizer;

    fn tagged(text: &str) -> Vec<(String, PosTag)> {
        let tokens = Tokenizer::new().tokenize(text);
        let tags = Tagger::default().tag_tokens(&tokens);
        tokens.into_iter().map(|t| t.text).zip(tags).collect()
    }

    fn tag_of(text: &str, word: &str) -> PosTag {
        tagged(text)
            .into_iter()
            .find(|(w, _)| w == word)
            .map(|(_, t)| t)
            .unwrap()
    }

    #[test]
    fn test_one_tag_per_token() {
        let tokens = Tokenizer::new().tokenize("Can you send me the report by Friday?");
        assert_eq!(Tagger::default().tag_tokens(&tokens).len(), tokens.len());
    }

    #[test]
    fn test_question_with_inversion() {
        let tags: Vec<PosTag> = tagged("Can you send me the report by Friday?")
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(
            tags,
            [
                PosTag::Aux,
                PosTag::Pron,
                PosTag::Verb,
                PosTag::Pron,
                PosTag::Det,
                PosTag::Noun,
                PosTag::Adp,
                PosTag::Propn,
                PosTag::Punct,
            ]
        );
    }

    #[test]
    fn test_contractions() {
        assert_eq!(tag_of("I'm so thrilled.", "'m"), PosTag::Aux);
        assert_eq!(tag_of("I'm so thrilled.", "so"), PosTag::Adv);
        assert_eq!(tag_of("I'm so thrilled.", "thrilled"), PosTag::Adj);
        assert_eq!(tag_of("We don't know.", "n't"), PosTag::Part);
        assert_eq!(tag_of("It's late.", "'s"), PosTag::Aux);
        assert_eq!(tag_of("John's car.", "'s"), PosTag::Part);
    }

    #[test]
    fn test_noun_verb_ambiguity() {
        assert_eq!(tag_of("Please call me.", "call"), PosTag::Verb);
        assert_eq!(tag_of("The call was long.", "call"), PosTag::Noun);
        assert_eq!(tag_of("I want to email you.", "email"), PosTag::Verb);
        assert_eq!(tag_of("I want to email you.", "to"), PosTag::Part);
        assert_eq!(tag_of("Go to the office.", "to"), PosTag::Adp);
    }

    #[test]
    fn test_unknown_words() {
        assert_eq!(tag_of("The blorption failed.", "blorption"), PosTag::Noun);
        assert_eq!(tag_of("She quickly left.", "quickly"), PosTag::Adv);
        assert_eq!(tag_of("We met Zorblax yesterday.", "Zorblax"), PosTag::Propn);
        assert_eq!(tag_of("NASA called.", "NASA"), PosTag::Propn);

        let tokens = Tokenizer::new().tokenize("zqx");
        let sentence = &SentenceSplitter::default().split("zqx", &tokens)[0];
        let tags = Tagger::default().tag(sentence, &tokens).unwrap();
        assert_eq!(tags.guessed(), 1);
        assert_eq!(tags.guessed_ratio(), 1.0);
    }

    #[test]
    fn test_non_word_tokens() {
        assert_eq!(tag_of("Pay $5 now!", "$"), PosTag::Sym);
        assert_eq!(tag_of("Pay $5 now!", "5"), PosTag::Num);
        assert_eq!(tag_of("Pay $5 now!", "!"), PosTag::Punct);
        assert_eq!(tag_of("see https://a.io", "https://a.io"), PosTag::X);
    }

    #[test]
    fn test_tag_uses_document_indices() {
        let text = "Hi there. Send it now.";
        let tokens = Tokenizer::new().tokenize(text);
        let sentences = SentenceSplitter::default().split(text, &tokens);
        let all = Tagger::default().tag_all(&sentences, &tokens).unwrap();
        assert_eq!(all.len(), 2);
        let second: Vec<usize> = all[1].iter().map(|(i, _)| i).collect();
        assert_eq!(second, vec![3, 4, 5, 6]);
        assert_eq!(all[1].get(3), Some(PosTag::Verb));
        assert_eq!(all[1].get(0), None);
    }

    #[test]
    fn test_out_of_range_sentence_is_error() {
        let tokens = Tokenizer::new().tokenize("one two");
        let bogus = Sentence {
            span: tokens[0].span,
            tokens: 0..5,
            paragraph: 0,
        };
        assert!(Tagger::default().tag(&bogus, &tokens).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let text = "The cat sat. ".repeat(50);
        let tokens = Tokenizer::new().tokenize(&text);
        let sentences = SentenceSplitter::default().split(&text, &tokens);
        let parallel = Tagger::default()
            .with_parallel_threshold(1)
            .tag_all(&sentences, &tokens)
            .unwrap();
        let sequential = Tagger::default()
            .with_parallel_threshold(usize::MAX)
            .tag_all(&sentences, &tokens)
            .unwrap();
        assert_eq!(parallel, sequential);
    }
}
