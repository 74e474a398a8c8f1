use super::lexicon::{Lexicons, SentimentLexicon};
use super::{confidence, ends_with_mark, label_sentences};
use crate::classify::{LabelResult, ModelHandle, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use std::sync::Arc;

/// Polarity magnitude below which a sentence counts as neutral
const NEUTRAL_BAND: f32 = 0.25;
/// Tokens after a negator whose polarity is flipped
const NEGATION_WINDOW: usize = 3;
/// Tokens after an intensifier that it still boosts
const INTENSIFIER_WINDOW: usize = 2;

/// Lexicon sentiment scorer with negation and intensifiers
#[derive(Debug, Clone)]
pub struct SentimentModel {
    lex: Arc<Lexicons>,
}

impl SentimentModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }
}

/// Signed polarity of a token run, and how many polar words it contains
pub(crate) fn polarity(tokens: &[FeatureToken], lex: &SentimentLexicon) -> (f32, usize) {
    let mut total = 0.0;
    let mut hits = 0;
    let mut negated_until = 0;
    let mut boosted_until = 0;
    let mut i = 0;

    while i < tokens.len() {
        if let Some(len) = lex.negators.match_at(tokens, i) {
            negated_until = i + len + NEGATION_WINDOW;
            i += len;
            continue;
        }
        if let Some(len) = lex.intensifiers.match_at(tokens, i) {
            boosted_until = i + len + INTENSIFIER_WINDOW;
            i += len;
            continue;
        }

        let (mut value, len) = if let Some(len) = lex.positive.match_at(tokens, i) {
            (1.0, len)
        } else if let Some(len) = lex.negative.match_at(tokens, i) {
            (-1.0, len)
        } else {
            i += 1;
            continue;
        };

        if i < boosted_until {
            value *= 1.5;
            boosted_until = 0;
        }
        if i < negated_until {
            // "not good" is weaker than "bad"
            value *= -0.5;
        }
        total += value;
        hits += 1;
        i += len;
    }

    if ends_with_mark(tokens, '!') {
        total *= 1.25;
    }
    (total, hits)
}

impl ModelHandle for SentimentModel {
    fn id(&self) -> &str {
        "builtin/sentiment"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let sentences = label_sentences(view, |tokens| {
            let (score, hits) = polarity(tokens, &self.lex.sentiment);
            if score >= NEUTRAL_BAND {
                ("positive", confidence(score), None)
            } else if score <= -NEUTRAL_BAND {
                ("negative", confidence(-score), None)
            } else if hits > 0 {
                ("neutral", 0.5, None)
            } else {
                ("neutral", 0.7, None)
            }
        });

        Ok(TaskResult::Label(LabelResult::from_sentences_preferring(
            sentences, "neutral",
        )))
    }
}
