use super::lexicon::{Lexicons, QuestionLexicon};
use super::{content_end, ends_with_mark, label_sentences};
use crate::classify::{LabelResult, ModelHandle, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use lexis_core::PosTag;
use std::sync::Arc;

/// Auxiliaries whose inversion marks a question even without a `?`
const MODALS: &[&str] = &["can", "could", "would", "will", "shall", "should", "may", "might"];

/// Question detector with question-type detail (`wh`, `yes_no`, `tag`, `choice`)
#[derive(Debug, Clone)]
pub struct QuestionModel {
    lex: Arc<Lexicons>,
}

impl QuestionModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }
}

/// Question type and confidence, or `None` for a non-question
pub(crate) fn detect(tokens: &[FeatureToken], lex: &QuestionLexicon) -> Option<(&'static str, f32)> {
    let start = tokens.iter().position(FeatureToken::is_word)?;
    let head = &tokens[start];
    let has_mark = ends_with_mark(tokens, '?');

    let wh = lex.wh_words.contains(&head.lower)
        || (head.pos == PosTag::Adp
            && tokens
                .get(start + 1)
                .is_some_and(|t| lex.wh_words.contains(&t.lower)));
    let inverted = lex.inverted_auxiliaries.contains(&head.lower) && {
        let mut subject = start + 1;
        if tokens.get(subject).is_some_and(|t| t.lower == "n't") {
            subject += 1;
        }
        tokens.get(subject).is_some_and(|t| {
            matches!(t.pos, PosTag::Pron | PosTag::Det | PosTag::Propn | PosTag::Noun)
        })
    };
    let tag = has_mark && is_tag_question(tokens);
    let choice = has_mark && !wh && tokens.iter().any(|t| t.lower == "or");

    let detail = if tag {
        "tag"
    } else if choice {
        "choice"
    } else if wh {
        "wh"
    } else {
        "yes_no"
    };

    if has_mark {
        let score = if wh || inverted || tag { 0.95 } else { 0.8 };
        return Some((detail, score));
    }
    if inverted && MODALS.contains(&head.lower.as_str()) && !ends_with_mark(tokens, '!') {
        return Some((detail, 0.6));
    }
    None
}

/// `..., isn't it?` or `..., right?`
fn is_tag_question(tokens: &[FeatureToken]) -> bool {
    let end = content_end(tokens);
    let Some(comma) = tokens[..end].iter().rposition(|t| t.text == ",") else {
        return false;
    };
    let tail: Vec<&FeatureToken> = tokens[comma + 1..end].iter().collect();

    match tail.as_slice() {
        [word] => matches!(word.lower.as_str(), "right" | "okay" | "ok" | "eh" | "yes" | "no"),
        [aux, pron] => aux.pos == PosTag::Aux && pron.pos == PosTag::Pron,
        [aux, neg, pron] => aux.pos == PosTag::Aux && neg.lower == "n't" && pron.pos == PosTag::Pron,
        _ => false,
    }
}

impl ModelHandle for QuestionModel {
    fn id(&self) -> &str {
        "builtin/question"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let sentences = label_sentences(view, |tokens| match detect(tokens, &self.lex.question) {
            Some((detail, score)) => ("true", score, Some(detail.to_string())),
            None if ends_with_mark(tokens, '.') || ends_with_mark(tokens, '!') => ("false", 0.9, None),
            None => ("false", 0.75, None),
        });

        Ok(TaskResult::Label(LabelResult::from_sentences_preferring(
            sentences, "false",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexicon::lexicons;
    use super::super::test_support::view;
    use super::*;

    fn label(text: &str) -> LabelResult {
        let model = QuestionModel::new(lexicons().unwrap());
        model.infer(&view(text)).unwrap().as_label().cloned().unwrap()
    }

    fn detail(text: &str) -> Option<String> {
        label(text).sentences[0].detail.clone()
    }

    #[test]
    fn test_yes_no_question() {
        let result = label("Can you send me the report by Friday? I'm so thrilled.");
        assert_eq!(result.label, "true");
        assert_eq!(result.sentences[0].label, "true");
        assert!(result.sentences[0].score >= 0.9);
        assert_eq!(result.sentences[0].detail.as_deref(), Some("yes_no"));
        assert_eq!(result.sentences[1].label, "false");
    }

    #[test]
    fn test_question_types() {
        assert_eq!(detail("Where is the office?").as_deref(), Some("wh"));
        assert_eq!(detail("Tea or coffee?").as_deref(), Some("choice"));
        assert_eq!(detail("It is late, isn't it?").as_deref(), Some("tag"));
        assert_eq!(detail("You fixed it, right?").as_deref(), Some("tag"));
    }

    #[test]
    fn test_missing_question_mark() {
        let result = label("Could you call me");
        assert_eq!(result.label, "true");
        assert!((result.score - 0.6).abs() < 1e-6);

        assert_eq!(label("Do it now.").label, "false");
        assert_eq!(label("").label, "false");
    }
}
