//! Model loading

use crate::classify::{ModelHandle, TaskKind};
use crate::error::ModelError;
use crate::models;
use std::sync::Arc;

/// Resolves model ids to loaded handles
///
/// Called once per task when a pipeline is built.
pub trait ModelLoader: Send + Sync {
    /// Load the model `model_id` for `task`
    fn load(&self, task: TaskKind, model_id: &str) -> Result<Arc<dyn ModelHandle>, ModelError>;
}

/// Serves the built-in reference models under `builtin/<task>`
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinModelLoader;

impl BuiltinModelLoader {
    /// Create the loader
    pub fn new() -> Self {
        Self
    }
}

impl ModelLoader for BuiltinModelLoader {
    fn load(&self, task: TaskKind, model_id: &str) -> Result<Arc<dyn ModelHandle>, ModelError> {
        let Some(name) = model_id.strip_prefix("builtin/") else {
            return Err(ModelError::UnknownModel(model_id.to_string()));
        };
        let served: TaskKind = name
            .parse()
            .map_err(|_| ModelError::UnknownModel(model_id.to_string()))?;
        if served != task {
            return Err(ModelError::TaskMismatch {
                model: model_id.to_string(),
                task,
            });
        }

        log::debug!("Loading built-in model {model_id}");
        models::builtin(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids() {
        let loader = BuiltinModelLoader::new();
        for task in TaskKind::ALL {
            let handle = loader.load(task, &format!("builtin/{task}")).unwrap();
            assert_eq!(handle.id(), format!("builtin/{task}"));
        }
    }

    #[test]
    fn test_load_errors() {
        let loader = BuiltinModelLoader::new();
        assert!(matches!(
            loader.load(TaskKind::Emotion, "hf/emotion-large"),
            Err(ModelError::UnknownModel(_))
        ));
        assert!(matches!(
            loader.load(TaskKind::Emotion, "builtin/horoscope"),
            Err(ModelError::UnknownModel(_))
        ));
        assert!(matches!(
            loader.load(TaskKind::Emotion, "builtin/sentiment"),
            Err(ModelError::TaskMismatch { .. })
        ));
    }
}
