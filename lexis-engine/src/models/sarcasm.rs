use super::lexicon::Lexicons;
use super::label_sentences;
use crate::classify::{LabelResult, ModelHandle, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use std::sync::Arc;

/// Conjunctions that introduce an honest contrast
const CONTRASTIVE: &[&str] = &["but", "although", "though", "however", "yet"];

/// Sarcasm detector from ironic cue phrases and praise of a bad situation
#[derive(Debug, Clone)]
pub struct SarcasmModel {
    lex: Arc<Lexicons>,
}

impl SarcasmModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }

    /// Positive word followed later by a negative one, with no contrastive
    /// conjunction between them ("I love waiting for hours")
    fn praises_bad_situation(&self, tokens: &[FeatureToken]) -> bool {
        let sentiment = &self.lex.sentiment;
        let Some(praise) = (0..tokens.len()).find(|&i| {
            sentiment.positive.match_at(tokens, i).is_some()
                && !tokens[i.saturating_sub(2)..i]
                    .iter()
                    .any(|t| sentiment.negators.contains(&t.lower))
        }) else {
            return false;
        };

        let rest = &tokens[praise + 1..];
        let complaint = (0..rest.len()).find(|&i| sentiment.negative.match_at(rest, i).is_some());
        complaint.is_some_and(|end| {
            !rest[..end]
                .iter()
                .any(|t| CONTRASTIVE.contains(&t.lower.as_str()))
        })
    }
}

impl ModelHandle for SarcasmModel {
    fn id(&self) -> &str {
        "builtin/sarcasm"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let sentences = label_sentences(view, |tokens| {
            if self.lex.sarcasm_cues.find(tokens).is_some() {
                ("sarcastic", 0.8, None)
            } else if self.praises_bad_situation(tokens) {
                ("sarcastic", 0.6, None)
            } else {
                ("not_sarcastic", 0.8, None)
            }
        });

        Ok(TaskResult::Label(LabelResult::from_sentences_preferring(
            sentences,
            "not_sarcastic",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexicon::lexicons;
    use super::super::test_support::view;
    use super::*;

    fn label(text: &str) -> LabelResult {
        let model = SarcasmModel::new(lexicons().unwrap());
        model.infer(&view(text)).unwrap().as_label().cloned().unwrap()
    }

    #[test]
    fn test_cue_phrases() {
        let result = label("Oh great, another meeting.");
        assert_eq!(result.label, "sarcastic");
        assert!((result.score - 0.8).abs() < 1e-6);
        assert_eq!(label("Yeah right, like that will happen.").label, "sarcastic");
    }

    #[test]
    fn test_praise_of_bad_situation() {
        assert_eq!(label("I love waiting in line for hours.").label, "sarcastic");
        assert_eq!(label("I love the design but the app is slow.").label, "not_sarcastic");
    }

    #[test]
    fn test_literal_text() {
        let result = label("Thanks for the report. See you tomorrow.");
        assert_eq!(result.label, "not_sarcastic");
        assert_eq!(result.sentences.len(), 2);
    }
}
