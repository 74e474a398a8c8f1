//! Concurrent classification fan-out
//!
//! Every requested classifier runs on tokio's blocking pool against the
//! same shared [`FeatureView`], bounded by its own timeout. Outcomes are
//! collected as they finish; a timeout, failure or panic only affects the
//! task it belongs to.

use crate::classify::{not_registered, run_guarded, ClassifierRegistry, TaskKind, TaskSet};
use crate::error::{PipelineError, Result, TaskError, TaskOutcome};
use crate::features::FeatureView;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Runs classifiers concurrently for one document at a time
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ClassifierRegistry>,
}

impl Dispatcher {
    /// Dispatcher over `registry`
    pub fn new(registry: Arc<ClassifierRegistry>) -> Self {
        Self { registry }
    }

    /// The registry classifiers are taken from
    pub fn registry(&self) -> &ClassifierRegistry {
        &self.registry
    }

    /// Run the classifiers for `tasks` and collect one outcome per task
    ///
    /// Unrequested classifiers are never invoked. Cancelling `cancel` aborts
    /// the remaining work and returns [`PipelineError::Cancelled`]; a
    /// classifier that already started keeps its blocking thread until it
    /// returns, but its result is discarded.
    pub async fn dispatch(
        &self,
        view: Arc<FeatureView>,
        tasks: &TaskSet,
        cancel: &CancellationToken,
    ) -> Result<BTreeMap<TaskKind, TaskOutcome>> {
        let mut outcomes = BTreeMap::new();
        let mut running = JoinSet::new();

        for task in tasks.iter() {
            let Some(classifier) = self.registry.get(task).cloned() else {
                outcomes.insert(task, Err(not_registered(task)));
                continue;
            };
            let view = Arc::clone(&view);
            let limit = classifier.timeout();

            running.spawn(async move {
                let work = tokio::task::spawn_blocking(move || run_guarded(classifier.as_ref(), &view));
                let outcome = match tokio::time::timeout(limit, work).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(e)) => Err(TaskError::internal(format!("worker failed: {e}"))),
                    Err(_) => Err(TaskError::timeout(task, limit)),
                };
                (task, outcome)
            });
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("classification cancelled with {} task(s) pending", running.len());
                    running.abort_all();
                    return Err(PipelineError::Cancelled);
                }
                joined = running.join_next() => match joined {
                    Some(Ok((task, outcome))) => {
                        if let Err(e) = &outcome {
                            log::warn!("{task} failed: {e}");
                        }
                        outcomes.insert(task, outcome);
                    }
                    Some(Err(e)) => log::warn!("classification task aborted: {e}"),
                    None => break,
                },
            }
        }

        for task in tasks.iter() {
            outcomes
                .entry(task)
                .or_insert_with(|| Err(TaskError::internal("classification task was lost")));
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Classifier, TaskResult};
    use crate::config::EngineConfig;
    use crate::models::test_support::view;
    use std::time::Duration;

    struct Sleepy {
        task: TaskKind,
        sleep: Duration,
    }

    impl Classifier for Sleepy {
        fn name(&self) -> &str {
            "test/sleepy"
        }

        fn task(&self) -> TaskKind {
            self.task
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        fn run(&self, _view: &FeatureView) -> std::result::Result<TaskResult, TaskError> {
            std::thread::sleep(self.sleep);
            Ok(TaskResult::Dates { dates: vec![] })
        }
    }

    fn dispatcher_with(sleepy: Sleepy) -> Dispatcher {
        let registry = ClassifierRegistry::builtin(&EngineConfig::default()).with(Arc::new(sleepy));
        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_runs_only_requested_tasks() {
        let dispatcher = Dispatcher::new(Arc::new(ClassifierRegistry::builtin(&EngineConfig::default())));
        let tasks = TaskSet::from([TaskKind::Question, TaskKind::Date]);
        let outcomes = dispatcher
            .dispatch(Arc::new(view("See you Friday?")), &tasks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcomes.keys().copied().collect::<Vec<_>>(), [TaskKind::Question, TaskKind::Date]);
        assert!(outcomes.values().all(|o| o.is_ok()));
    }

    #[tokio::test]
    async fn test_timeout_is_per_task() {
        let dispatcher = dispatcher_with(Sleepy {
            task: TaskKind::Date,
            sleep: Duration::from_millis(300),
        });
        let tasks = TaskSet::from([TaskKind::Date, TaskKind::Sentiment]);
        let outcomes = dispatcher
            .dispatch(Arc::new(view("Great news!")), &tasks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcomes[&TaskKind::Date].as_ref().unwrap_err().kind(), "timeout");
        assert!(outcomes[&TaskKind::Sentiment].is_ok());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_dispatch() {
        let dispatcher = dispatcher_with(Sleepy {
            task: TaskKind::Date,
            sleep: Duration::from_millis(30),
        });
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = dispatcher
            .dispatch(Arc::new(view("Hi.")), &TaskSet::from([TaskKind::Date]), &cancel)
            .await;
        assert_eq!(result, Err(PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn test_no_tasks() {
        let dispatcher = Dispatcher::new(Arc::new(ClassifierRegistry::new()));
        let outcomes = dispatcher
            .dispatch(Arc::new(view("Hi.")), &TaskSet::empty(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcomes.is_empty());
    }
}
