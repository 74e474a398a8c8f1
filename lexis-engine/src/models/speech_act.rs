use super::lexicon::Lexicons;
use super::{ends_with_mark, imperative_start, label_sentences, question};
use crate::classify::{LabelResult, ModelHandle, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use std::sync::Arc;

/// Speech act classifier
///
/// Cues are checked in a fixed order: greeting, gratitude, apology,
/// question, command, exclamation, and otherwise statement.
#[derive(Debug, Clone)]
pub struct SpeechActModel {
    lex: Arc<Lexicons>,
}

impl SpeechActModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }

    fn classify(&self, tokens: &[FeatureToken]) -> (&'static str, f32) {
        let lex = &self.lex.speech_act;
        let opening = tokens.iter().position(FeatureToken::is_word);

        if opening.is_some_and(|at| lex.greetings.match_at(tokens, at).is_some()) {
            return ("greeting", 0.85);
        }
        if lex.gratitude.find(tokens).is_some() {
            return ("gratitude", 0.85);
        }
        if lex.apologies.find(tokens).is_some() {
            return ("apology", 0.85);
        }
        if let Some((_, score)) = question::detect(tokens, &self.lex.question) {
            return ("question", score);
        }
        if imperative_start(tokens, &self.lex.tasks).is_some() {
            return ("command", 0.8);
        }
        if ends_with_mark(tokens, '!') {
            return ("exclamation", 0.7);
        }
        ("statement", 0.7)
    }
}

impl ModelHandle for SpeechActModel {
    fn id(&self) -> &str {
        "builtin/speech_act"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let sentences = label_sentences(view, |tokens| {
            let (label, score) = self.classify(tokens);
            (label, score, None)
        });
        Ok(TaskResult::Label(LabelResult::from_sentences(
            sentences,
            "statement",
        )))
    }
}
