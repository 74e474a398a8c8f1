//! Runtime lookup tables built from a [`LanguageConfig`]
//!
//! All word lookups are case-insensitive; keys are stored lowercased.

use crate::language::config::{Gazetteers, LanguageConfig, Lemmas};
use crate::types::PosTag;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Tags a single word may carry, ordered by `PosTag`'s declaration order
pub type TagSet = SmallVec<[PosTag; 2]>;

/// Multi-word phrase lookup keyed by the phrase's first word
#[derive(Debug, Clone, Default)]
pub struct PhraseSet {
    by_first: HashMap<String, Vec<Vec<String>>>,
}

impl PhraseSet {
    /// Build from phrases written with single spaces between words
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut by_first: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        for phrase in phrases {
            let words: Vec<String> = phrase
                .as_ref()
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
            if let Some(first) = words.first() {
                by_first.entry(first.clone()).or_default().push(words);
            }
        }
        // Longest phrases first so the first hit is the longest match
        for candidates in by_first.values_mut() {
            candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        }
        Self { by_first }
    }

    /// Number of words in the longest phrase starting at `words[0]`
    pub fn longest_match(&self, words: &[&str]) -> Option<usize> {
        let first = words.first()?.to_lowercase();
        self.by_first.get(&first)?.iter().find_map(|phrase| {
            let matches = phrase.len() <= words.len()
                && phrase
                    .iter()
                    .zip(words)
                    .all(|(expected, word)| word.eq_ignore_ascii_case(expected));
            matches.then_some(phrase.len())
        })
    }

    /// Whether the exact single word is a one-word phrase
    pub fn contains_word(&self, word: &str) -> bool {
        self.longest_match(&[word]) == Some(1)
    }
}

fn lower_set<I, S>(words: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    words.into_iter().map(|w| w.as_ref().to_lowercase()).collect()
}

/// Gazetteer tables for the entity recognizer
#[derive(Debug, Clone, Default)]
pub struct GazetteerTables {
    pub first_names: HashSet<String>,
    pub locations: PhraseSet,
    pub organizations: PhraseSet,
    pub organization_suffixes: HashSet<String>,
    pub location_cues: HashSet<String>,
    pub months: HashSet<String>,
    pub month_abbreviations: HashSet<String>,
    pub weekdays: HashSet<String>,
    pub relative_days: HashSet<String>,
    pub currency_symbols: HashSet<String>,
    pub currency_words: HashSet<String>,
    pub time_markers: HashSet<String>,
}

impl From<&Gazetteers> for GazetteerTables {
    fn from(g: &Gazetteers) -> Self {
        Self {
            first_names: lower_set(&g.first_names),
            locations: PhraseSet::new(&g.locations),
            organizations: PhraseSet::new(&g.organizations),
            organization_suffixes: lower_set(&g.organization_suffixes),
            location_cues: lower_set(&g.location_cues),
            months: lower_set(&g.months),
            month_abbreviations: lower_set(&g.month_abbreviations),
            weekdays: lower_set(&g.weekdays),
            relative_days: lower_set(&g.relative_days),
            currency_symbols: g.currency_symbols.iter().cloned().collect(),
            currency_words: lower_set(&g.currency_words),
            time_markers: lower_set(&g.time_markers),
        }
    }
}

fn lower_map(map: &HashMap<String, String>) -> HashMap<String, String> {
    map.iter()
        .map(|(form, lemma)| (form.to_lowercase(), lemma.to_lowercase()))
        .collect()
}

/// Irregular lemma tables for the lemmatizer
#[derive(Debug, Clone, Default)]
pub struct LemmaTables {
    pub verbs: HashMap<String, String>,
    pub nouns: HashMap<String, String>,
    pub adjectives: HashMap<String, String>,
}

impl From<&Lemmas> for LemmaTables {
    fn from(l: &Lemmas) -> Self {
        Self {
            verbs: lower_map(&l.verbs),
            nouns: lower_map(&l.nouns),
            adjectives: lower_map(&l.adjectives),
        }
    }
}

/// Language tables consumed by the splitter, tagger and entity recognizer
#[derive(Debug, Clone)]
pub struct LanguageTables {
    code: String,
    name: String,
    terminators: HashSet<char>,
    closing: HashSet<char>,
    titles: HashSet<String>,
    abbreviations: HashSet<String>,
    sentence_starters: HashSet<String>,
    lexicon: HashMap<String, TagSet>,
    gazetteers: GazetteerTables,
    stopwords: HashSet<String>,
    lemmas: LemmaTables,
}

impl LanguageTables {
    /// Build runtime tables from a validated configuration
    pub fn from_config(config: &LanguageConfig) -> Result<Self, String> {
        config.validate()?;

        let mut lexicon: HashMap<String, TagSet> = HashMap::new();
        for (tag_name, words) in &config.lexicon {
            let tag: PosTag = tag_name.parse().map_err(|e| format!("{e}"))?;
            for word in words {
                let tags = lexicon.entry(word.to_lowercase()).or_default();
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        for tags in lexicon.values_mut() {
            tags.sort();
        }

        let sentence_starters = config
            .sentence_starters
            .categories
            .values()
            .flatten()
            .map(|w| w.to_lowercase())
            .collect();

        Ok(Self {
            code: config.metadata.code.clone(),
            name: config.metadata.name.clone(),
            terminators: config.terminators.chars.iter().copied().collect(),
            closing: config.enclosures.closing.iter().copied().collect(),
            titles: lower_set(&config.abbreviations.titles),
            abbreviations: lower_set(&config.abbreviations.common),
            sentence_starters,
            lexicon,
            gazetteers: GazetteerTables::from(&config.gazetteers),
            stopwords: lower_set(&config.stopwords.words),
            lemmas: LemmaTables::from(&config.lemmas),
        })
    }

    /// Add abbreviations that may end a sentence (like `etc`)
    pub fn with_extra_abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim_end_matches('.').to_lowercase()),
        );
        self
    }

    /// Language code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Language display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the token is made only of terminal punctuation
    pub fn is_terminator_token(&self, token: &str) -> bool {
        !token.is_empty() && token.chars().all(|c| self.terminators.contains(&c))
    }

    /// Whether the token is a single closing quote or bracket
    pub fn is_closing_token(&self, token: &str) -> bool {
        let mut chars = token.chars();
        matches!((chars.next(), chars.next()), (Some(c), None) if self.closing.contains(&c))
    }

    /// Title abbreviation that never ends a sentence (`Dr`, `Mrs`)
    pub fn is_title(&self, word: &str) -> bool {
        self.titles.contains(&word.to_lowercase())
    }

    /// Known abbreviation of either kind
    pub fn is_abbreviation(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.titles.contains(&lower) || self.abbreviations.contains(&lower)
    }

    /// Word commonly found at the start of a sentence
    pub fn is_sentence_starter(&self, word: &str) -> bool {
        self.sentence_starters.contains(&word.to_lowercase())
    }

    /// Lexicon tags for a lowercased word (empty when unknown)
    pub fn lexicon_tags(&self, lower: &str) -> &[PosTag] {
        self.lexicon.get(lower).map(|t| t.as_slice()).unwrap_or(&[])
    }

    /// Whether the lowercased word carries `tag` in the lexicon
    pub fn has_tag(&self, lower: &str, tag: PosTag) -> bool {
        self.lexicon_tags(lower).contains(&tag)
    }

    /// Gazetteers for entity recognition
    pub fn gazetteers(&self) -> &GazetteerTables {
        &self.gazetteers
    }

    /// Whether the word is a stopword
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    /// Whether the lowercased word appears anywhere in the word lists
    pub fn is_known_word(&self, lower: &str) -> bool {
        self.lexicon.contains_key(lower)
            || self.stopwords.contains(lower)
            || self.lemmas.verbs.contains_key(lower)
            || self.lemmas.nouns.contains_key(lower)
    }

    /// Irregular lemma tables
    pub fn lemmas(&self) -> &LemmaTables {
        &self.lemmas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_set_prefers_longest() {
        let set = PhraseSet::new(["New York", "New York City", "York"]);
        assert_eq!(set.longest_match(&["new", "york", "city", "hall"]), Some(3));
        assert_eq!(set.longest_match(&["New", "York"]), Some(2));
        assert_eq!(set.longest_match(&["New", "Jersey"]), None);
        assert!(set.contains_word("york"));
        assert!(!set.contains_word("new"));
    }

    #[test]
    fn test_english_tables_lookups() {
        let tables = crate::language::english();
        assert_eq!(tables.code(), "en");
        assert!(tables.is_title("Dr"));
        assert!(tables.is_abbreviation("etc"));
        assert!(!tables.is_title("etc"));
        assert!(tables.is_sentence_starter("The"));
        assert!(tables.is_terminator_token("?!"));
        assert!(!tables.is_terminator_token("?a"));
        assert!(tables.is_closing_token("\""));
        assert!(tables.has_tag("the", PosTag::Det));
        assert!(tables.lexicon_tags("zyzzyva").is_empty());
        assert!(tables.is_stopword("The"));
        assert!(!tables.is_stopword("report"));
        assert_eq!(tables.lemmas().verbs.get("went").map(String::as_str), Some("go"));
        assert!(tables.is_known_word("children"));
        assert!(!tables.is_known_word("zyzzyva"));
    }

    #[test]
    fn test_ambiguous_words_keep_all_tags_sorted() {
        let tables = crate::language::english();
        let tags = tables.lexicon_tags("that");
        assert!(tags.contains(&PosTag::Det));
        assert!(tags.contains(&PosTag::Sconj));
        assert!(tags.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extra_abbreviations() {
        let tables = (*crate::language::english())
            .clone()
            .with_extra_abbreviations(["Approx.", "Ref"]);
        assert!(tables.is_abbreviation("ref"));
        assert!(tables.is_abbreviation("approx"));
    }
}
