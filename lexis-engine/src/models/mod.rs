//! Built-in reference models
//!
//! Deterministic lexicon and rule based scorers that satisfy the
//! [`ModelHandle`] contract, so the pipeline runs end to end without
//! trained weights. Each is served by [`BuiltinModelLoader`] under the id
//! `builtin/<task>`.
//!
//! [`BuiltinModelLoader`]: crate::classify::BuiltinModelLoader

mod dates;
mod emotion;
pub(crate) mod lexicon;
mod question;
mod sarcasm;
mod sentiment;
mod speech_act;
mod tasks;

pub use dates::DateModel;
pub use emotion::EmotionModel;
pub use question::QuestionModel;
pub use sarcasm::SarcasmModel;
pub use sentiment::SentimentModel;
pub use speech_act::SpeechActModel;
pub use tasks::TaskModel;

use crate::classify::{ModelHandle, SentenceLabel, TaskKind};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use lexicon::TaskLexicon;
use lexis_core::{PosTag, TokenKind};
use std::sync::Arc;

/// Reference model for `task`
pub fn builtin(task: TaskKind) -> Result<Arc<dyn ModelHandle>, ModelError> {
    let lex = lexicon::lexicons()?;
    let handle: Arc<dyn ModelHandle> = match task {
        TaskKind::SpeechAct => Arc::new(SpeechActModel::new(lex)),
        TaskKind::Question => Arc::new(QuestionModel::new(lex)),
        TaskKind::Emotion => Arc::new(EmotionModel::new(lex)),
        TaskKind::Sarcasm => Arc::new(SarcasmModel::new(lex)),
        TaskKind::Sentiment => Arc::new(SentimentModel::new(lex)),
        TaskKind::Date => Arc::new(DateModel::new()),
        TaskKind::Task => Arc::new(TaskModel::new(lex)),
    };
    Ok(handle)
}

/// Map evidence strength (>= 0) to a confidence in [0.5, 1)
fn confidence(strength: f32) -> f32 {
    let strength = strength.max(0.0);
    0.5 + 0.5 * strength / (strength + 1.0)
}

/// Label every sentence of the view with `label_one`
fn label_sentences<F>(view: &FeatureView, mut label_one: F) -> Vec<SentenceLabel>
where
    F: FnMut(&[FeatureToken]) -> (&'static str, f32, Option<String>),
{
    (0..view.sentences().len())
        .map(|index| {
            let (label, score, detail) = label_one(view.sentence_tokens(index));
            SentenceLabel {
                sentence: index,
                label: label.to_string(),
                score: score.clamp(0.0, 1.0),
                detail,
            }
        })
        .collect()
}

/// Whether the trailing punctuation of the sentence contains `mark`
fn ends_with_mark(tokens: &[FeatureToken], mark: char) -> bool {
    tokens
        .iter()
        .rev()
        .take_while(|t| matches!(t.kind, TokenKind::Punctuation | TokenKind::Symbol))
        .any(|t| t.text.contains(mark))
}

/// Index one past the last token that is not trailing punctuation
fn content_end(tokens: &[FeatureToken]) -> usize {
    tokens
        .iter()
        .rposition(|t| !matches!(t.kind, TokenKind::Punctuation | TokenKind::Symbol))
        .map_or(0, |i| i + 1)
}

/// Start of an imperative clause opening the sentence
///
/// Leading discourse words ("please", "just") and commas are skipped. The
/// clause starts at a base-form verb (its own lemma) not followed by an
/// auxiliary, or at a negative imperative ("don't touch").
fn imperative_start(tokens: &[FeatureToken], lex: &TaskLexicon) -> Option<usize> {
    let start = tokens
        .iter()
        .position(|t| !(lex.imperative_skip.contains(&t.lower) || t.text == ","))?;
    let head = &tokens[start];
    let next = tokens.get(start + 1);

    if head.lower == "do" && next.is_some_and(|t| t.lower == "n't") {
        return tokens
            .get(start + 2)
            .is_some_and(|t| t.pos == PosTag::Verb)
            .then_some(start);
    }

    let base_form = head.lemma == head.lower;
    let subject_follows = next.is_some_and(|t| matches!(t.pos, PosTag::Aux | PosTag::Verb));
    (head.pos == PosTag::Verb && head.is_word() && base_form && !subject_follows).then_some(start)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::features::{FeatureAssembler, FeatureView};
    use crate::stages::LinguisticStages;
    use chrono::NaiveDate;

    pub fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    pub fn view(text: &str) -> FeatureView {
        view_with(text, true)
    }

    pub fn view_with(text: &str, entities: bool) -> FeatureView {
        let doc = LinguisticStages::default()
            .analyze(text, reference_date(), entities)
            .unwrap();
        FeatureAssembler::new().assemble(&doc).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::view;
    use super::*;

    #[test]
    fn test_confidence_is_bounded() {
        assert_eq!(confidence(0.0), 0.5);
        assert!(confidence(1.0) > 0.7);
        assert!(confidence(100.0) < 1.0);
        assert_eq!(confidence(-3.0), 0.5);
    }

    #[test]
    fn test_imperative_start() {
        let lex = lexicon::lexicons().unwrap();
        let starts = |text: &str| imperative_start(view(text).sentence_tokens(0), &lex.tasks);

        assert_eq!(starts("Send me the file."), Some(0));
        assert_eq!(starts("Please send me the file."), Some(1));
        assert_eq!(starts("Don't forget it."), Some(0));
        assert_eq!(starts("I sent the file."), None);
        assert_eq!(starts("Meeting moved to Friday."), None);
    }

    #[test]
    fn test_irregular_past_tense_is_not_imperative() {
        let lex = lexicon::lexicons().unwrap();
        let starts = |text: &str| imperative_start(view(text).sentence_tokens(0), &lex.tasks);

        assert_eq!(starts("Then left."), None);
        assert_eq!(starts("Went home early."), None);
        assert_eq!(starts("Then leave."), Some(1));
    }

    #[test]
    fn test_every_task_has_a_builtin() {
        for task in TaskKind::ALL {
            let model = builtin(task).unwrap();
            let view = view("Hello there.");
            assert!(model.infer(&view).unwrap().conforms_to(task).is_ok());
        }
    }
}
