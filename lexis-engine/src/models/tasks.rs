use super::lexicon::{Lexicons, TaskLexicon};
use super::{content_end, imperative_start};
use crate::classify::{ExtractedTask, ModelHandle, TaskCategory, TaskResult};
use crate::error::ModelError;
use crate::features::{FeatureToken, FeatureView};
use std::sync::Arc;

/// Extracts requests, reminders, instructions and proposals
#[derive(Debug, Clone)]
pub struct TaskModel {
    lex: Arc<Lexicons>,
}

impl TaskModel {
    pub(crate) fn new(lex: Arc<Lexicons>) -> Self {
        Self { lex }
    }
}

/// Category, start of the action phrase within the sentence, and confidence
fn find_task(tokens: &[FeatureToken], lex: &TaskLexicon) -> Option<(TaskCategory, usize, f32)> {
    if let Some((at, len)) = lex.reminder_cues.find(tokens) {
        return Some((TaskCategory::Reminder, at + len, 0.85));
    }
    if let Some((at, len)) = lex.proposal_cues.find(tokens) {
        return Some((TaskCategory::Proposal, at + len, 0.75));
    }

    let first = tokens.iter().position(FeatureToken::is_word)?;
    let addressed = lex.request_modals.contains(&tokens[first].lower)
        && tokens.get(first + 1).is_some_and(|t| t.lower == "you");
    if addressed {
        let mut start = first + 2;
        while tokens
            .get(start)
            .is_some_and(|t| lex.imperative_skip.contains(&t.lower))
        {
            start += 1;
        }
        return Some((TaskCategory::Request, start, 0.85));
    }
    if let Some((at, len)) = lex.request_cues.find(tokens) {
        return Some((TaskCategory::Request, at + len, 0.8));
    }

    imperative_start(tokens, lex).map(|start| (TaskCategory::Instruction, start, 0.7))
}

impl ModelHandle for TaskModel {
    fn id(&self) -> &str {
        "builtin/task"
    }

    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError> {
        let mut tasks = Vec::new();

        for (index, sentence) in view.sentences().iter().enumerate() {
            let tokens = view.sentence_tokens(index);
            let Some((category, start, confidence)) = find_task(tokens, &self.lex.tasks) else {
                continue;
            };
            let end = content_end(tokens);
            if start >= end {
                continue;
            }

            let offset = sentence.tokens.start;
            if let Some((span, text)) = view.slice_tokens(offset + start..offset + end) {
                tasks.push(ExtractedTask {
                    span,
                    text: text.to_string(),
                    sentence: index,
                    category,
                    confidence,
                });
            }
        }

        Ok(TaskResult::Tasks { tasks })
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexicon::lexicons;
    use super::super::test_support::view;
    use super::*;

    fn extract(text: &str) -> Vec<ExtractedTask> {
        let model = TaskModel::new(lexicons().unwrap());
        model.infer(&view(text)).unwrap().as_tasks().unwrap().to_vec()
    }

    #[test]
    fn test_request() {
        let tasks = extract("Can you send me the report by Friday? I'm so thrilled.");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].category, TaskCategory::Request);
        assert_eq!(tasks[0].text, "send me the report by Friday");
        assert_eq!(tasks[0].sentence, 0);
    }

    #[test]
    fn test_categories() {
        let tasks = extract("Don't forget to call Sarah. Let's meet tomorrow. Review the draft.");
        let found: Vec<_> = tasks.iter().map(|t| (t.category, t.text.as_str())).collect();
        assert_eq!(
            found,
            [
                (TaskCategory::Reminder, "call Sarah"),
                (TaskCategory::Proposal, "meet tomorrow"),
                (TaskCategory::Instruction, "Review the draft"),
            ]
        );
    }

    #[test]
    fn test_statements_have_no_tasks() {
        assert!(extract("The report arrived yesterday.").is_empty());
        assert!(extract("Then left.").is_empty());
        assert!(extract("").is_empty());
    }
}
