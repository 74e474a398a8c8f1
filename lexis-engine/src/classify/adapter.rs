//! Classifier capability and the model adapter that implements it

use crate::classify::{TaskKind, TaskResult};
use crate::error::{ModelError, TaskError};
use crate::features::FeatureView;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// An opaque scoring function
///
/// Handles are loaded once and shared between documents, so inference must
/// not need exclusive access.
pub trait ModelHandle: Send + Sync {
    /// Identifier the handle was loaded under
    fn id(&self) -> &str;

    /// Score the view
    fn infer(&self, view: &FeatureView) -> Result<TaskResult, ModelError>;
}

/// One classification head
pub trait Classifier: Send + Sync {
    /// Display name, usually the model id
    fn name(&self) -> &str;

    /// Task this classifier answers
    fn task(&self) -> TaskKind;

    /// Time the dispatcher allows for one `run`
    fn timeout(&self) -> Duration;

    /// Classify the view
    ///
    /// Must not depend on anything but `view`.
    fn run(&self, view: &FeatureView) -> Result<TaskResult, TaskError>;
}

/// [`Classifier`] backed by an optional model handle
#[derive(Clone)]
pub struct ModelAdapter {
    task: TaskKind,
    name: String,
    handle: Option<Arc<dyn ModelHandle>>,
    unavailable_reason: String,
    timeout: Duration,
}

impl ModelAdapter {
    /// Adapter over a loaded handle
    pub fn new(task: TaskKind, handle: Arc<dyn ModelHandle>) -> Self {
        Self {
            task,
            name: handle.id().to_string(),
            handle: Some(handle),
            unavailable_reason: String::new(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Adapter whose model could not be loaded
    pub fn unavailable(task: TaskKind, reason: impl Into<String>) -> Self {
        Self {
            task,
            name: format!("unavailable/{task}"),
            handle: None,
            unavailable_reason: reason.into(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a model is loaded
    pub fn is_available(&self) -> bool {
        self.handle.is_some()
    }
}

impl fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("task", &self.task)
            .field("name", &self.name)
            .field("available", &self.is_available())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Classifier for ModelAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn task(&self) -> TaskKind {
        self.task
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn run(&self, view: &FeatureView) -> Result<TaskResult, TaskError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| TaskError::ModelUnavailable {
                task: self.task,
                reason: self.unavailable_reason.clone(),
            })?;

        let result = handle
            .infer(view)
            .map_err(|e| TaskError::internal(format!("{}: {e}", self.name)))?;

        result
            .conforms_to(self.task)
            .map_err(|reason| TaskError::internal(format!("{}: {reason}", self.name)))?;

        Ok(result)
    }
}
