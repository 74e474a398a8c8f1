//! Explicit task to classifier registry

use crate::classify::{BuiltinModelLoader, Classifier, ModelAdapter, ModelLoader, TaskKind, TaskSet};
use crate::config::EngineConfig;
use crate::error::{TaskError, TaskOutcome};
use crate::features::FeatureView;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Classifiers keyed by the task they answer, filled once at startup
#[derive(Clone, Default)]
pub struct ClassifierRegistry {
    classifiers: BTreeMap<TaskKind, Arc<dyn Classifier>>,
}

impl ClassifierRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of built-in models for every task
    pub fn builtin(config: &EngineConfig) -> Self {
        Self::from_loader(&BuiltinModelLoader::new(), config)
    }

    /// Load one model per task through `loader`
    ///
    /// A model that fails to load is registered as unavailable, so its task
    /// reports `ModelUnavailable` instead of failing pipeline construction.
    pub fn from_loader(loader: &dyn ModelLoader, config: &EngineConfig) -> Self {
        let mut registry = Self::new();
        for task in TaskKind::ALL {
            let model_id = config.model_id_for(task);
            let adapter = match loader.load(task, &model_id) {
                Ok(handle) => ModelAdapter::new(task, handle),
                Err(e) => {
                    log::warn!("Model '{model_id}' for {task} unavailable: {e}");
                    ModelAdapter::unavailable(task, e.to_string())
                }
            };
            registry.register(Arc::new(adapter.with_timeout(config.timeout_for(task))));
        }
        registry
    }

    /// Register `classifier` under its task, returning the one it replaces
    pub fn register(&mut self, classifier: Arc<dyn Classifier>) -> Option<Arc<dyn Classifier>> {
        self.classifiers.insert(classifier.task(), classifier)
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.register(classifier);
        self
    }

    /// Classifier for `task`
    pub fn get(&self, task: TaskKind) -> Option<&Arc<dyn Classifier>> {
        self.classifiers.get(&task)
    }

    /// Registered tasks in order
    pub fn tasks(&self) -> impl Iterator<Item = TaskKind> + '_ {
        self.classifiers.keys().copied()
    }

    /// Number of registered classifiers
    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Run every registered classifier on the view
    pub fn run_all(&self, view: &FeatureView) -> BTreeMap<TaskKind, TaskOutcome> {
        self.run_selected(view, &self.tasks().collect())
    }

    /// Run the classifiers for `tasks`
    ///
    /// Each run is isolated: a failure or panic becomes that task's error.
    /// Requested tasks without a classifier report `ModelUnavailable`.
    pub fn run_selected(&self, view: &FeatureView, tasks: &TaskSet) -> BTreeMap<TaskKind, TaskOutcome> {
        let selected: Vec<(TaskKind, Option<&Arc<dyn Classifier>>)> =
            tasks.iter().map(|task| (task, self.get(task))).collect();

        let run = |(task, classifier): &(TaskKind, Option<&Arc<dyn Classifier>>)| {
            let outcome = match classifier {
                Some(classifier) => run_guarded(classifier.as_ref(), view),
                None => Err(not_registered(*task)),
            };
            (*task, outcome)
        };

        #[cfg(feature = "parallel")]
        let outcomes = selected.par_iter().map(run).collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes = selected.iter().map(run).collect();

        outcomes
    }
}

impl fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.classifiers.iter().map(|(task, c)| (task, c.name())))
            .finish()
    }
}

pub(crate) fn not_registered(task: TaskKind) -> TaskError {
    TaskError::ModelUnavailable {
        task,
        reason: "no classifier registered".to_string(),
    }
}

/// Run one classifier, turning a panic into an internal error
pub(crate) fn run_guarded(classifier: &dyn Classifier, view: &FeatureView) -> TaskOutcome {
    match panic::catch_unwind(AssertUnwindSafe(|| classifier.run(view))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("Classifier {} panicked: {message}", classifier.name());
            Err(TaskError::internal(format!(
                "{} panicked: {message}",
                classifier.name()
            )))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::TaskResult;
    use crate::models::test_support::view;
    use std::time::Duration;

    struct Panicking;

    impl Classifier for Panicking {
        fn name(&self) -> &str {
            "test/panicking"
        }

        fn task(&self) -> TaskKind {
            TaskKind::Emotion
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(1)
        }

        fn run(&self, _view: &FeatureView) -> Result<TaskResult, TaskError> {
            panic!("tensor shape mismatch")
        }
    }

    #[test]
    fn test_builtin_registry_covers_every_task() {
        let registry = ClassifierRegistry::builtin(&EngineConfig::default());
        assert_eq!(registry.len(), TaskKind::ALL.len());
        assert_eq!(registry.get(TaskKind::Date).unwrap().name(), "builtin/date");
        assert_eq!(
            registry.get(TaskKind::Date).unwrap().timeout(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_failed_load_registers_unavailable_adapter() {
        let mut config = EngineConfig::default();
        config.model_ids.insert(TaskKind::Sarcasm, "remote/sarcasm-xl".into());
        let registry = ClassifierRegistry::builtin(&config);

        let outcomes = registry.run_all(&view("Nice work."));
        assert_eq!(outcomes.len(), TaskKind::ALL.len());
        assert_eq!(
            outcomes[&TaskKind::Sarcasm].as_ref().unwrap_err().kind(),
            "model_unavailable"
        );
        assert!(outcomes[&TaskKind::Sentiment].is_ok());
    }

    #[test]
    fn test_panic_is_isolated() {
        let registry = ClassifierRegistry::builtin(&EngineConfig::default()).with(Arc::new(Panicking));
        let tasks = TaskSet::from([TaskKind::Emotion, TaskKind::Sentiment]);
        let outcomes = registry.run_selected(&view("I'm so thrilled."), &tasks);

        let err = outcomes[&TaskKind::Emotion].as_ref().unwrap_err();
        assert_eq!(err.kind(), "internal");
        assert!(err.to_string().contains("tensor shape mismatch"));
        let sentiment = outcomes[&TaskKind::Sentiment].as_ref().unwrap();
        assert_eq!(sentiment.as_label().map(|l| l.label.as_str()), Some("positive"));
    }

    #[test]
    fn test_unregistered_task() {
        let registry = ClassifierRegistry::new();
        let outcomes = registry.run_selected(&view("Hi."), &TaskSet::from([TaskKind::Question]));
        assert_eq!(outcomes[&TaskKind::Question], Err(not_registered(TaskKind::Question)));
        assert!(registry.run_all(&view("Hi.")).is_empty());
    }
}
