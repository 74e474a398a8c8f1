//! Batch progress for the annotate command
//!
//! One tick per input document. Besides the position, the bar message names
//! the last finished document and keeps a running count of documents that
//! could not be annotated and of tasks that failed inside annotated ones.

use indicatif::{ProgressBar, ProgressStyle};
use lexis_api::{ApiError, DocumentAnnotation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Progress reporter shared by the annotation workers
pub struct ProgressReporter {
    bar: Option<ProgressBar>,
    quiet: bool,
    failed_documents: AtomicUsize,
    failed_tasks: AtomicUsize,
}

impl ProgressReporter {
    /// Create a reporter; `quiet` suppresses the bar but not the counts
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: None,
            quiet,
            failed_documents: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
        }
    }

    /// Show a bar for `total` documents; a single document gets none
    pub fn start(&mut self, total: u64) {
        if self.quiet || total < 2 {
            return;
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} documents {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Record the outcome of one document
    pub fn document_done(&self, source: &str, result: &Result<DocumentAnnotation, ApiError>) {
        let status = match result {
            Ok(annotation) => {
                let failed: Vec<&str> = annotation
                    .tasks
                    .iter()
                    .filter(|(_, task)| task.failure().is_some())
                    .map(|(name, _)| name.as_str())
                    .collect();
                if !failed.is_empty() {
                    log::warn!("{source}: task(s) failed: {}", failed.join(", "));
                    self.failed_tasks.fetch_add(failed.len(), Ordering::Relaxed);
                }
                DocumentStatus::Annotated {
                    failed_tasks: failed.len(),
                }
            }
            Err(e) => {
                log::debug!("{source}: {e}");
                self.failed_documents.fetch_add(1, Ordering::Relaxed);
                DocumentStatus::Failed
            }
        };

        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} {}", status.describe(source), self.tally()));
            bar.inc(1);
        }
    }

    /// Documents that could not be annotated so far
    pub fn failed_documents(&self) -> usize {
        self.failed_documents.load(Ordering::Relaxed)
    }

    /// Task failures inside annotated documents so far
    pub fn failed_tasks(&self) -> usize {
        self.failed_tasks.load(Ordering::Relaxed)
    }

    /// Close the bar with a summary
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            let tally = self.tally();
            if tally.is_empty() {
                bar.finish_with_message("done");
            } else {
                bar.finish_with_message(format!("done {tally}"));
            }
        }
    }

    /// `[2 failed, 3 task errors]`, or empty when nothing failed
    fn tally(&self) -> String {
        let mut parts = Vec::new();
        match self.failed_documents() {
            0 => {}
            n => parts.push(format!("{n} failed")),
        }
        match self.failed_tasks() {
            0 => {}
            1 => parts.push("1 task error".to_string()),
            n => parts.push(format!("{n} task errors")),
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("[{}]", parts.join(", "))
        }
    }
}

enum DocumentStatus {
    Annotated { failed_tasks: usize },
    Failed,
}

impl DocumentStatus {
    fn describe(&self, source: &str) -> String {
        match self {
            DocumentStatus::Annotated { failed_tasks: 0 } => format!("annotated {source}"),
            DocumentStatus::Annotated { failed_tasks } => {
                format!("annotated {source} ({failed_tasks} task(s) failed)")
            }
            DocumentStatus::Failed => format!("failed {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexis_api::{TaskAnnotation, TaskFailure};

    fn annotation(failed_tasks: usize) -> DocumentAnnotation {
        let mut annotation = lexis_api::annotate("", &lexis_api::TaskSet::empty()).unwrap();
        for i in 0..failed_tasks {
            annotation.tasks.insert(
                format!("task{i}"),
                TaskAnnotation::Failed(TaskFailure {
                    error: "timeout".to_string(),
                    message: "model timed out".to_string(),
                }),
            );
        }
        annotation
    }

    #[test]
    fn test_counts_document_and_task_failures() {
        let progress = ProgressReporter::new(true);
        progress.document_done("a.txt", &Ok(annotation(0)));
        progress.document_done("b.txt", &Ok(annotation(2)));
        progress.document_done(
            "c.txt",
            &Err(ApiError::MalformedInput("not UTF-8".to_string())),
        );

        assert_eq!(progress.failed_documents(), 1);
        assert_eq!(progress.failed_tasks(), 2);
        assert_eq!(progress.tally(), "[1 failed, 2 task errors]");
    }

    #[test]
    fn test_clean_run_has_empty_tally() {
        let progress = ProgressReporter::new(true);
        progress.document_done("a.txt", &Ok(annotation(0)));
        assert_eq!(progress.tally(), "");
        progress.finish();
    }

    #[test]
    fn test_status_descriptions() {
        let one = DocumentStatus::Annotated { failed_tasks: 1 };
        assert_eq!(one.describe("a.txt"), "annotated a.txt (1 task(s) failed)");
        assert_eq!(DocumentStatus::Failed.describe("b.txt"), "failed b.txt");
    }
}
