use super::lexicon::{Lexicons, Phrases};
use super::{confidence, ends_with_mark, label_sentences};
use crate::classify::{LabelResult, ModelHandle, TaskKind, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use std::sync::Arc;

/// Emotion classifier over Plutchik's eight basic emotions
#[derive(Debug, Clone)]
pub struct EmotionModel {
    lex: Arc<Lexicons>,
}

impl EmotionModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }

    /// Strongest emotion of a sentence and its evidence strength
    fn strongest(&self, tokens: &[FeatureToken]) -> Option<(&'static str, f32)> {
        let sentiment = &self.lex.sentiment;
        let preceded_by = |at: usize, window: usize, list: &Phrases| {
            tokens[at.saturating_sub(window)..at]
                .iter()
                .any(|t| list.contains(&t.lower))
        };

        let mut best: Option<(&'static str, f32)> = None;
        for (label, cues) in &self.lex.emotions {
            let mut strength = 0.0;
            let mut i = 0;
            while i < tokens.len() {
                let Some(len) = cues.match_at(tokens, i) else {
                    i += 1;
                    continue;
                };
                if !preceded_by(i, 3, &sentiment.negators) {
                    strength += if preceded_by(i, 2, &sentiment.intensifiers) {
                        1.5
                    } else {
                        1.0
                    };
                }
                i += len;
            }

            let Some(label) = TaskKind::Emotion
                .labels()
                .iter()
                .copied()
                .find(|l| *l == label.as_str())
            else {
                continue;
            };
            if strength > 0.0 && best.map_or(true, |(_, s)| strength > s) {
                best = Some((label, strength));
            }
        }

        best.map(|(label, strength)| {
            let strength = if ends_with_mark(tokens, '!') {
                strength * 1.25
            } else {
                strength
            };
            (label, strength)
        })
    }
}

impl ModelHandle for EmotionModel {
    fn id(&self) -> &str {
        "builtin/emotion"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let sentences = label_sentences(view, |tokens| match self.strongest(tokens) {
            Some((label, strength)) => (label, confidence(strength), None),
            None => ("no_emotion", 0.6, None),
        });

        Ok(TaskResult::Label(LabelResult::from_sentences_preferring(
            sentences,
            "no_emotion",
        )))
    }
}
