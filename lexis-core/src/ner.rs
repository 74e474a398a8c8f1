//! Named entity recognizer
//!
//! Candidates come from four sources, all confined to one sentence:
//! token kinds (URLs, e-mail), numeric patterns (money, percent, time,
//! dates), gazetteer phrases, and runs of proper nouns. Overlapping
//! candidates are resolved greedily by confidence, then length, then
//! earliest start, so the accepted entities never overlap.

use crate::error::{CoreError, Result};
use crate::language::LanguageTables;
use crate::tagger::SentenceTags;
use crate::types::{Entity, EntityType, PosTag, Sentence, Token, TokenKind};
use regex::Regex;
use std::ops::Range;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

struct NumberPatterns {
    clock: Regex,
    numeric_date: Regex,
    month_day: Regex,
    day: Regex,
    year: Regex,
}

fn number_patterns() -> &'static NumberPatterns {
    static PATTERNS: OnceLock<NumberPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let compile = |p: &str| Regex::new(p).expect("entity patterns are valid");
        NumberPatterns {
            clock: compile(r"^\d{1,2}:\d{2}(?::\d{2})?$"),
            numeric_date: compile(r"^\d{1,4}[/\-]\d{1,2}[/\-]\d{1,4}$"),
            month_day: compile(r"^(\d{1,2})/(\d{1,2})$"),
            day: compile(r"^(\d{1,2})(?:st|nd|rd|th)?$"),
            year: compile(r"^(?:1[89]|20)\d{2}$"),
        }
    })
}

const MAGNITUDES: &[&str] = &["thousand", "million", "billion", "trillion", "k", "m", "bn"];
const DATE_MODIFIERS: &[&str] = &["next", "last", "this", "coming"];
const PERIODS: &[&str] = &["week", "month", "year", "weekend"];

/// Rule-based entity recognizer
#[derive(Debug, Clone)]
pub struct EntityRecognizer {
    tables: Arc<LanguageTables>,
    parallel_threshold: usize,
}

impl Default for EntityRecognizer {
    fn default() -> Self {
        Self::new(crate::language::english())
    }
}

/// Sentence-local view shared by the candidate generators
struct Window<'a> {
    text: &'a str,
    tokens: &'a [Token],
    tags: &'a [PosTag],
    lowers: Vec<String>,
    base: usize,
}

impl Window<'_> {
    fn entity(&self, local: Range<usize>, entity_type: EntityType, confidence: f32) -> Result<Entity> {
        let span = self.tokens[local.start]
            .span
            .cover(&self.tokens[local.end - 1].span);
        Ok(Entity {
            span,
            tokens: self.base + local.start..self.base + local.end,
            entity_type,
            confidence,
            text: span.slice(self.text)?.to_string(),
        })
    }

    fn lower(&self, i: usize) -> Option<&str> {
        self.lowers.get(i).map(String::as_str)
    }

    fn glued(&self, i: usize) -> bool {
        i > 0 && self.tokens[i - 1].span.end == self.tokens[i].span.start
    }
}

impl EntityRecognizer {
    /// Create a recognizer over the given language tables
    pub fn new(tables: Arc<LanguageTables>) -> Self {
        Self {
            tables,
            parallel_threshold: crate::tagger::DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Set the sentence count above which `recognize_all` runs in parallel
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Recognize entities in one tagged sentence
    pub fn recognize(
        &self,
        text: &str,
        sentence: &Sentence,
        tokens: &[Token],
        tags: &SentenceTags,
    ) -> Result<Vec<Entity>> {
        let sentence_tokens = sentence.tokens_in(tokens)?;
        if tags.len() != sentence_tokens.len() {
            return Err(CoreError::TokenRangeOutOfBounds {
                start: sentence.tokens.start,
                end: sentence.tokens.end,
                len: tags.len(),
            });
        }

        let window = Window {
            text,
            tokens: sentence_tokens,
            tags: tags.tags(),
            lowers: sentence_tokens.iter().map(Token::lower).collect(),
            base: sentence.tokens.start,
        };

        let mut candidates = Vec::new();
        self.token_kind_candidates(&window, &mut candidates)?;
        self.numeric_candidates(&window, &mut candidates)?;
        self.date_word_candidates(&window, &mut candidates)?;
        self.gazetteer_candidates(&window, &mut candidates)?;
        self.proper_noun_candidates(&window, &mut candidates)?;

        Ok(resolve_overlaps(candidates))
    }

    /// Recognize entities in every sentence, ordered by position
    pub fn recognize_all(
        &self,
        text: &str,
        sentences: &[Sentence],
        tokens: &[Token],
        tags: &[SentenceTags],
    ) -> Result<Vec<Entity>> {
        let pairs: Vec<(&Sentence, &SentenceTags)> = sentences.iter().zip(tags).collect();

        #[cfg(feature = "parallel")]
        let per_sentence: Result<Vec<Vec<Entity>>> = if pairs.len() > self.parallel_threshold {
            pairs
                .par_iter()
                .map(|(sentence, tags)| self.recognize(text, sentence, tokens, tags))
                .collect()
        } else {
            pairs
                .iter()
                .map(|(sentence, tags)| self.recognize(text, sentence, tokens, tags))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let per_sentence: Result<Vec<Vec<Entity>>> = pairs
            .iter()
            .map(|(sentence, tags)| self.recognize(text, sentence, tokens, tags))
            .collect();

        Ok(per_sentence?.into_iter().flatten().collect())
    }

    fn token_kind_candidates(&self, w: &Window<'_>, out: &mut Vec<Entity>) -> Result<()> {
        for (i, token) in w.tokens.iter().enumerate() {
            let entity_type = match token.kind {
                TokenKind::Url => EntityType::Url,
                TokenKind::Email => EntityType::Email,
                _ => continue,
            };
            out.push(w.entity(i..i + 1, entity_type, 0.99)?);
        }
        Ok(())
    }

    fn numeric_candidates(&self, w: &Window<'_>, out: &mut Vec<Entity>) -> Result<()> {
        let g = self.tables.gazetteers();
        let patterns = number_patterns();

        for (i, token) in w.tokens.iter().enumerate() {
            if token.kind != TokenKind::Number {
                continue;
            }
            let text = token.text.as_str();
            let next = w.lower(i + 1);

            // $5, $1.5 million
            if i > 0 && w.glued(i) && g.currency_symbols.contains(&w.tokens[i - 1].text) {
                let end = if next.is_some_and(|n| MAGNITUDES.contains(&n)) { i + 2 } else { i + 1 };
                out.push(w.entity(i - 1..end, EntityType::Money, 0.95)?);
                continue;
            }

            // 20 dollars, 3 million euros
            let magnitude = usize::from(next.is_some_and(|n| MAGNITUDES.contains(&n)));
            if w.lower(i + 1 + magnitude).is_some_and(|n| g.currency_words.contains(n)) {
                out.push(w.entity(i..i + 2 + magnitude, EntityType::Money, 0.9)?);
                continue;
            }

            if text.ends_with('%') {
                out.push(w.entity(i..i + 1, EntityType::Percent, 0.95)?);
                continue;
            }
            if matches!(next, Some("percent" | "per cent" | "%")) {
                out.push(w.entity(i..i + 2, EntityType::Percent, 0.9)?);
                continue;
            }

            let followed_by_marker = next.is_some_and(|n| g.time_markers.contains(n));
            if patterns.clock.is_match(text) {
                let end = if followed_by_marker { i + 2 } else { i + 1 };
                out.push(w.entity(i..end, EntityType::Time, 0.9)?);
                continue;
            }
            if followed_by_marker && text.parse::<u32>().is_ok_and(|h| (1..=12).contains(&h)) {
                out.push(w.entity(i..i + 2, EntityType::Time, 0.9)?);
                continue;
            }

            if patterns.numeric_date.is_match(text) {
                out.push(w.entity(i..i + 1, EntityType::Date, 0.9)?);
                continue;
            }
            // 12/25
            if is_month_day(text) {
                out.push(w.entity(i..i + 1, EntityType::Date, 0.7)?);
                continue;
            }

            // 3 March (2024), 1st of Dec 2024
            let month = if next == Some("of") { i + 2 } else { i + 1 };
            if is_day(text) && self.is_month_at(w, month) {
                let end = if w.tokens.get(month + 1).is_some_and(|t| patterns.year.is_match(&t.text)) {
                    month + 2
                } else {
                    month + 1
                };
                out.push(w.entity(i..end, EntityType::Date, 0.9)?);
            }
        }
        Ok(())
    }

    fn date_word_candidates(&self, w: &Window<'_>, out: &mut Vec<Entity>) -> Result<()> {
        let g = self.tables.gazetteers();
        let patterns = number_patterns();

        for i in 0..w.tokens.len() {
            let Some(lower) = w.lower(i) else { break };
            let modifier = i > 0 && w.lower(i - 1).is_some_and(|p| DATE_MODIFIERS.contains(&p));
            let start = if modifier { i - 1 } else { i };

            if g.weekdays.contains(lower) {
                out.push(w.entity(start..i + 1, EntityType::Date, 0.85)?);
            } else if g.relative_days.contains(lower) {
                out.push(w.entity(i..i + 1, EntityType::Date, 0.8)?);
            } else if modifier && PERIODS.contains(&lower) {
                out.push(w.entity(start..i + 1, EntityType::Date, 0.75)?);
            } else if self.is_month_at(w, i) {
                // March 3, March 3rd, 2024, Dec 3rd
                let mut end = i + 1;
                let mut confidence = 0.6;
                if w.tokens.get(end).is_some_and(|t| is_day(&t.text)) {
                    end += 1;
                    confidence = 0.9;
                    let comma = usize::from(w.lower(end) == Some(","));
                    if w.tokens.get(end + comma).is_some_and(|t| patterns.year.is_match(&t.text)) {
                        end += comma + 1;
                    }
                } else if w.tokens.get(end).is_some_and(|t| patterns.year.is_match(&t.text)) {
                    end += 1;
                    confidence = 0.85;
                } else if lower == "may" || g.month_abbreviations.contains(lower) {
                    // "may" alone is almost always the modal, "Jan" alone a name
                    continue;
                }
                out.push(w.entity(start..end, EntityType::Date, confidence)?);
            } else if matches!(lower, "noon" | "midnight") {
                out.push(w.entity(i..i + 1, EntityType::Time, 0.8)?);
            }
        }
        Ok(())
    }

    fn gazetteer_candidates(&self, w: &Window<'_>, out: &mut Vec<Entity>) -> Result<()> {
        let g = self.tables.gazetteers();
        for i in 0..w.tokens.len() {
            if !w.tokens[i].is_capitalized() && !is_upper_word(&w.tokens[i].text) {
                continue;
            }
            let words: Vec<&str> = w.tokens[i..].iter().map(|t| t.text.as_str()).collect();
            if let Some(len) = g.organizations.longest_match(&words) {
                out.push(w.entity(i..i + len, EntityType::Organization, 0.9)?);
            }
            if let Some(len) = g.locations.longest_match(&words) {
                out.push(w.entity(i..i + len, EntityType::Location, 0.85)?);
            }
        }
        Ok(())
    }

    fn proper_noun_candidates(&self, w: &Window<'_>, out: &mut Vec<Entity>) -> Result<()> {
        let g = self.tables.gazetteers();
        let in_run = |i: usize| {
            w.tags[i] == PosTag::Propn
                && w.tokens[i].kind == TokenKind::Word
                && !g.weekdays.contains(&w.lowers[i])
                && !g.months.contains(&w.lowers[i])
        };

        let mut i = 0;
        while i < w.tokens.len() {
            if !in_run(i) {
                i += 1;
                continue;
            }
            let start = i;
            while i < w.tokens.len() && in_run(i) {
                i += 1;
            }
            let end = i;

            let last = &w.lowers[end - 1];
            let first = &w.lowers[start];
            let titled = self.preceded_by_title(w, start);
            let cued = start > 0 && g.location_cues.contains(&w.lowers[start - 1]);

            let (entity_type, confidence) = if g.organization_suffixes.contains(last) && end - start > 1 {
                (EntityType::Organization, 0.8)
            } else if titled || g.first_names.contains(first) {
                (EntityType::Person, 0.85)
            } else if cued {
                (EntityType::Location, 0.6)
            } else if end - start > 1 {
                (EntityType::Misc, 0.5)
            } else {
                (EntityType::Misc, 0.4)
            };
            out.push(w.entity(start..end, entity_type, confidence)?);
        }
        Ok(())
    }

    /// Capitalized month name or abbreviation at `i`
    fn is_month_at(&self, w: &Window<'_>, i: usize) -> bool {
        let g = self.tables.gazetteers();
        w.tokens.get(i).is_some_and(Token::is_capitalized)
            && w.lower(i)
                .is_some_and(|l| g.months.contains(l) || g.month_abbreviations.contains(l))
    }

    /// `Dr Smith` or `Dr. Smith`
    fn preceded_by_title(&self, w: &Window<'_>, start: usize) -> bool {
        match start {
            0 => false,
            1 => self.tables.is_title(&w.tokens[0].text),
            _ => {
                self.tables.is_title(&w.tokens[start - 1].text)
                    || (w.tokens[start - 1].text == "." && self.tables.is_title(&w.tokens[start - 2].text))
            }
        }
    }
}

/// Greedy overlap resolution
///
/// Candidates are ranked by confidence (descending), then span length
/// (descending), then start offset (ascending). Each candidate is accepted
/// unless it overlaps one already accepted. The result is ordered by start.
pub fn resolve_overlaps(mut candidates: Vec<Entity>) -> Vec<Entity> {
    candidates.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.span.len().cmp(&a.span.len()))
            .then_with(|| a.span.start.cmp(&b.span.start))
    });

    let mut accepted: Vec<Entity> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if accepted.iter().all(|e| !e.span.overlaps(&candidate.span)) {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|e| e.span.start);
    accepted
}

fn is_day(text: &str) -> bool {
    number_patterns()
        .day
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
        .is_some_and(|d| (1..=31).contains(&d))
}

fn is_month_day(text: &str) -> bool {
    let Some(c) = number_patterns().month_day.captures(text) else {
        return false;
    };
    let month = c[1].parse::<u32>().unwrap_or(0);
    let day = c[2].parse::<u32>().unwrap_or(0);
    (1..=12).contains(&month) && (1..=31).contains(&day)
}

fn is_upper_word(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && text.chars().all(|c| !c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitter::SentenceSplitter;
    use crate::tagger::Tagger;
    use crate::tokenizer::Tokenizer;

    fn entities(text: &str) -> Vec<(String, EntityType)> {
        let tokens = Tokenizer::new().tokenize(text);
        let sentences = SentenceSplitter::default().split(text, &tokens);
        let tags = Tagger::default().tag_all(&sentences, &tokens).unwrap();
        EntityRecognizer::default()
            .recognize_all(text, &sentences, &tokens, &tags)
            .unwrap()
            .into_iter()
            .map(|e| (e.text, e.entity_type))
            .collect()
    }

    fn has(text: &str, surface: &str, entity_type: EntityType) -> bool {
        entities(text)
            .iter()
            .any(|(t, ty)| t == surface && *ty == entity_type)
    }

    #[test]
    fn test_weekday_is_date() {
        assert_eq!(
            entities("Can you send me the report by Friday?"),
            [("Friday".to_string(), EntityType::Date)]
        );
        assert!(has("See you next Monday.", "next Monday", EntityType::Date));
    }

    #[test]
    fn test_people_and_places() {
        assert!(has("I met John Smith in Paris.", "John Smith", EntityType::Person));
        assert!(has("I met John Smith in Paris.", "Paris", EntityType::Location));
        assert!(has("Ask Dr. Watson about it.", "Watson", EntityType::Person));
        assert!(has("She flew to New York City.", "New York", EntityType::Location));
    }

    #[test]
    fn test_organizations() {
        assert!(has("He works at Google now.", "Google", EntityType::Organization));
        assert!(has("We hired Acme Labs today.", "Acme Labs", EntityType::Organization));
    }

    #[test]
    fn test_numeric_entities() {
        assert!(has("It costs $5 million.", "$5 million", EntityType::Money));
        assert!(has("Pay 20 dollars.", "20 dollars", EntityType::Money));
        assert!(has("Sales rose 12% today.", "12%", EntityType::Percent));
        assert!(has("Meet at 3:30 pm.", "3:30 pm", EntityType::Time));
        assert!(has("Meet at 5 pm.", "5 pm", EntityType::Time));
        assert!(has("Due on 2024-03-05.", "2024-03-05", EntityType::Date));
        assert!(has("Due March 5, 2024.", "March 5, 2024", EntityType::Date));
        assert!(has("Due 5 March.", "5 March", EntityType::Date));
    }

    #[test]
    fn test_abbreviated_and_short_dates() {
        assert!(has("Due Dec 3rd.", "Dec 3rd", EntityType::Date));
        assert!(has("It ends Feb 29, 2024.", "Feb 29, 2024", EntityType::Date));
        assert!(has("Ship it on 12/25.", "12/25", EntityType::Date));
        assert!(has("Due on the 1st of March 2024.", "1st of March 2024", EntityType::Date));
        assert!(!has("Score was 13/40.", "13/40", EntityType::Date));
        assert!(!entities("Ask Jan about it.")
            .iter()
            .any(|(_, ty)| *ty == EntityType::Date));
    }

    #[test]
    fn test_contact_entities() {
        assert!(has("Write to bob@example.com now.", "bob@example.com", EntityType::Email));
        assert!(has("See https://example.com for more.", "https://example.com", EntityType::Url));
    }

    #[test]
    fn test_modal_may_is_not_a_date() {
        assert!(entities("We may leave.").is_empty());
    }

    #[test]
    fn test_overlap_prefers_confidence_then_length_then_start() {
        let text = "aaaa bbbb";
        let make = |start, end, confidence| Entity {
            span: crate::types::Span::new(start, end).unwrap(),
            tokens: 0..1,
            entity_type: EntityType::Misc,
            confidence,
            text: text[start..end].to_string(),
        };

        let kept = resolve_overlaps(vec![make(0, 4, 0.5), make(0, 9, 0.9)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].span.end, 9);

        let kept = resolve_overlaps(vec![make(0, 4, 0.5), make(0, 9, 0.5)]);
        assert_eq!(kept[0].span.end, 9);

        let kept = resolve_overlaps(vec![make(5, 9, 0.5), make(0, 4, 0.5), make(2, 6, 0.5)]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].span.start, 0);
        assert_eq!(kept[1].span.start, 5);
    }

    #[test]
    fn test_entities_stay_within_sentences() {
        let text = "I live in Paris. London is big.";
        let tokens = Tokenizer::new().tokenize(text);
        let sentences = SentenceSplitter::default().split(text, &tokens);
        let tags = Tagger::default().tag_all(&sentences, &tokens).unwrap();
        let found = EntityRecognizer::default()
            .recognize_all(text, &sentences, &tokens, &tags)
            .unwrap();
        for entity in &found {
            assert!(sentences.iter().any(|s| s.span.contains(&entity.span)));
        }
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_mismatched_tags_is_error() {
        let text = "Hello there.";
        let tokens = Tokenizer::new().tokenize(text);
        let sentences = SentenceSplitter::default().split(text, &tokens);
        let other = Tokenizer::new().tokenize("Hi.");
        let other_sentences = SentenceSplitter::default().split("Hi.", &other);
        let wrong = Tagger::default().tag(&other_sentences[0], &other).unwrap();
        assert!(EntityRecognizer::default()
            .recognize(text, &sentences[0], &tokens, &wrong)
            .is_err());
    }
}
