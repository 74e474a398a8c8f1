//! Word lists shared by the reference models

use crate::error::ModelError;
use crate::features::FeatureToken;
use lexis_core::Tokenizer;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

static EMBEDDED: OnceLock<Result<Arc<Lexicons>, String>> = OnceLock::new();

/// Raw TOML schema
#[derive(Debug, Deserialize)]
struct LexiconConfig {
    sentiment: SentimentConfig,
    emotion: BTreeMap<String, Vec<String>>,
    speech_act: SpeechActConfig,
    question: QuestionConfig,
    sarcasm: SarcasmConfig,
    tasks: TasksConfig,
}

#[derive(Debug, Deserialize)]
struct SentimentConfig {
    positive: Vec<String>,
    negative: Vec<String>,
    intensifiers: Vec<String>,
    negators: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechActConfig {
    greetings: Vec<String>,
    gratitude: Vec<String>,
    apologies: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionConfig {
    wh_words: Vec<String>,
    inverted_auxiliaries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SarcasmConfig {
    cues: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TasksConfig {
    request_modals: Vec<String>,
    request_cues: Vec<String>,
    reminder_cues: Vec<String>,
    proposal_cues: Vec<String>,
    imperative_skip: Vec<String>,
}

/// Word and phrase list matched against normalized token forms
#[derive(Debug, Clone, Default)]
pub(crate) struct Phrases {
    words: HashSet<String>,
    /// Multi-token entries, longest first
    multi: Vec<Vec<String>>,
}

impl Phrases {
    fn new(entries: &[String]) -> Self {
        let tokenizer = Tokenizer::new();
        let mut phrases = Self::default();
        for entry in entries {
            let parts: Vec<String> = tokenizer
                .tokenize(entry)
                .iter()
                .map(|t| t.lower().replace('’', "'"))
                .collect();
            match parts.len() {
                0 => {}
                1 => {
                    phrases.words.extend(parts);
                }
                _ => phrases.multi.push(parts),
            }
        }
        phrases.multi.sort_by_key(|p| std::cmp::Reverse(p.len()));
        phrases
    }

    /// Whether a single token form is listed
    pub(crate) fn contains(&self, lower: &str) -> bool {
        self.words.contains(lower)
    }

    /// Length in tokens of the longest entry starting at `tokens[at]`
    pub(crate) fn match_at(&self, tokens: &[FeatureToken], at: usize) -> Option<usize> {
        let rest = tokens.get(at..)?;
        self.multi
            .iter()
            .find(|phrase| {
                phrase.len() <= rest.len()
                    && phrase.iter().zip(rest).all(|(word, token)| *word == token.lower)
            })
            .map(Vec::len)
            .or_else(|| rest.first().filter(|t| self.contains(&t.lower)).map(|_| 1))
    }

    /// First match in `tokens` as `(start, len)`
    pub(crate) fn find(&self, tokens: &[FeatureToken]) -> Option<(usize, usize)> {
        (0..tokens.len()).find_map(|i| self.match_at(tokens, i).map(|len| (i, len)))
    }
}

/// Sentiment word lists
#[derive(Debug, Clone)]
pub(crate) struct SentimentLexicon {
    pub positive: Phrases,
    pub negative: Phrases,
    pub intensifiers: Phrases,
    pub negators: Phrases,
}

/// Speech act cue lists
#[derive(Debug, Clone)]
pub(crate) struct SpeechActLexicon {
    pub greetings: Phrases,
    pub gratitude: Phrases,
    pub apologies: Phrases,
}

/// Question cue lists
#[derive(Debug, Clone)]
pub(crate) struct QuestionLexicon {
    pub wh_words: Phrases,
    pub inverted_auxiliaries: Phrases,
}

/// Task cue lists
#[derive(Debug, Clone)]
pub(crate) struct TaskLexicon {
    pub request_modals: Phrases,
    pub request_cues: Phrases,
    pub reminder_cues: Phrases,
    pub proposal_cues: Phrases,
    pub imperative_skip: Phrases,
}

/// Every list used by the reference models
#[derive(Debug, Clone)]
pub(crate) struct Lexicons {
    pub sentiment: SentimentLexicon,
    /// Emotion label -> cue words, in vocabulary order
    pub emotions: Vec<(String, Phrases)>,
    pub speech_act: SpeechActLexicon,
    pub question: QuestionLexicon,
    pub sarcasm_cues: Phrases,
    pub tasks: TaskLexicon,
}

impl Lexicons {
    fn from_toml_str(source: &str) -> Result<Self, String> {
        let config: LexiconConfig =
            toml::from_str(source).map_err(|e| format!("failed to parse lexicons: {e}"))?;

        let vocabulary = crate::classify::TaskKind::Emotion.labels();
        let mut emotions = Vec::new();
        for (label, words) in &config.emotion {
            if !vocabulary.contains(&label.as_str()) {
                return Err(format!("unknown emotion '{label}' in lexicons"));
            }
            emotions.push((label.clone(), Phrases::new(words)));
        }
        emotions.sort_by_key(|(label, _)| vocabulary.iter().position(|v| v == label));

        Ok(Self {
            sentiment: SentimentLexicon {
                positive: Phrases::new(&config.sentiment.positive),
                negative: Phrases::new(&config.sentiment.negative),
                intensifiers: Phrases::new(&config.sentiment.intensifiers),
                negators: Phrases::new(&config.sentiment.negators),
            },
            emotions,
            speech_act: SpeechActLexicon {
                greetings: Phrases::new(&config.speech_act.greetings),
                gratitude: Phrases::new(&config.speech_act.gratitude),
                apologies: Phrases::new(&config.speech_act.apologies),
            },
            question: QuestionLexicon {
                wh_words: Phrases::new(&config.question.wh_words),
                inverted_auxiliaries: Phrases::new(&config.question.inverted_auxiliaries),
            },
            sarcasm_cues: Phrases::new(&config.sarcasm.cues),
            tasks: TaskLexicon {
                request_modals: Phrases::new(&config.tasks.request_modals),
                request_cues: Phrases::new(&config.tasks.request_cues),
                reminder_cues: Phrases::new(&config.tasks.reminder_cues),
                proposal_cues: Phrases::new(&config.tasks.proposal_cues),
                imperative_skip: Phrases::new(&config.tasks.imperative_skip),
            },
        })
    }
}

/// Embedded lexicons, parsed on first access
pub(crate) fn lexicons() -> Result<Arc<Lexicons>, ModelError> {
    EMBEDDED
        .get_or_init(|| {
            log::debug!("Loading embedded model lexicons");
            Lexicons::from_toml_str(include_str!("../../configs/lexicons.toml")).map(Arc::new)
        })
        .clone()
        .map_err(ModelError::Load)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureAssembler;
    use crate::stages::LinguisticStages;
    use chrono::NaiveDate;

    fn tokens(text: &str) -> Vec<FeatureToken> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let doc = LinguisticStages::default().analyze(text, date, false).unwrap();
        FeatureAssembler::new().assemble(&doc).unwrap().tokens().to_vec()
    }

    #[test]
    fn test_embedded_lexicons_load() {
        let lex = lexicons().unwrap();
        assert!(lex.sentiment.positive.contains("thrilled"));
        assert_eq!(lex.emotions.first().map(|(l, _)| l.as_str()), Some("joy"));
        assert_eq!(lex.emotions.len(), 8);
    }

    #[test]
    fn test_phrases_match_contractions() {
        let lex = lexicons().unwrap();
        let toks = tokens("Don't forget to call.");
        assert_eq!(lex.tasks.reminder_cues.match_at(&toks, 0), Some(4));
        assert_eq!(lex.tasks.reminder_cues.find(&toks), Some((0, 4)));
        assert_eq!(lex.tasks.proposal_cues.match_at(&tokens("Let's go."), 0), Some(2));
    }

    #[test]
    fn test_unknown_emotion_rejected() {
        let source = include_str!("../../configs/lexicons.toml").replace("[emotion]\njoy", "[emotion]\nglee");
        let err = Lexicons::from_toml_str(&source).unwrap_err();
        assert!(err.contains("glee"));
    }
}
