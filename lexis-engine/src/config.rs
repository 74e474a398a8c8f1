//! Configuration types for the engine

use crate::classify::TaskKind;
use crate::error::{PipelineError, Result};
use std::collections::BTreeMap;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Timeout applied to adapters without an override
    pub default_timeout: Duration,
    /// Per-task timeout overrides
    pub task_timeouts: BTreeMap<TaskKind, Duration>,
    /// Per-task model ids (default `builtin/<task>`)
    pub model_ids: BTreeMap<TaskKind, String>,
    /// Run entity recognition
    pub entities: bool,
    /// Sentence count above which tagging and NER run in parallel
    pub parallel_threshold: usize,
    /// Largest accepted input in bytes
    pub max_input_bytes: usize,
    /// Linguistic analyses kept in the cache (0 disables it)
    pub cache_capacity: usize,
    /// Report per-stage timings
    pub benchmark: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(2),
            task_timeouts: BTreeMap::new(),
            model_ids: BTreeMap::new(),
            entities: true,
            parallel_threshold: lexis_core::DEFAULT_PARALLEL_THRESHOLD,
            max_input_bytes: 10 * 1024 * 1024, // 10MB
            cache_capacity: 0,
            benchmark: false,
        }
    }
}

impl EngineConfig {
    /// Create a fast configuration: short timeouts, no entity stage, cache on
    pub fn fast() -> Self {
        Self {
            default_timeout: Duration::from_millis(500),
            entities: false,
            parallel_threshold: 16,
            cache_capacity: 256,
            ..Self::default()
        }
    }

    /// Create a configuration that favours completeness over latency
    pub fn accurate() -> Self {
        Self {
            default_timeout: Duration::from_secs(10),
            entities: true,
            parallel_threshold: 64,
            ..Self::default()
        }
    }

    /// Create a balanced configuration
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Timeout for `task`
    pub fn timeout_for(&self, task: TaskKind) -> Duration {
        self.task_timeouts
            .get(&task)
            .copied()
            .unwrap_or(self.default_timeout)
    }

    /// Model id for `task`
    pub fn model_id_for(&self, task: TaskKind) -> String {
        self.model_ids
            .get(&task)
            .cloned()
            .unwrap_or_else(|| format!("builtin/{task}"))
    }

    /// Check invariants
    pub fn validate(&self) -> Result<()> {
        if self.default_timeout.is_zero() {
            return Err(PipelineError::Config("default timeout must be positive".into()));
        }
        if let Some((task, _)) = self.task_timeouts.iter().find(|(_, t)| t.is_zero()) {
            return Err(PipelineError::Config(format!("timeout for {task} must be positive")));
        }
        if self.max_input_bytes == 0 {
            return Err(PipelineError::Config("max_input_bytes must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for config in [EngineConfig::default(), EngineConfig::fast(), EngineConfig::accurate()] {
            assert!(config.validate().is_ok());
        }
        assert!(!EngineConfig::fast().entities);
        assert_eq!(EngineConfig::balanced(), EngineConfig::default());
    }

    #[test]
    fn test_overrides() {
        let mut config = EngineConfig::default();
        config.task_timeouts.insert(TaskKind::Date, Duration::from_millis(50));
        config.model_ids.insert(TaskKind::Emotion, "custom/emotion".into());

        assert_eq!(config.timeout_for(TaskKind::Date), Duration::from_millis(50));
        assert_eq!(config.timeout_for(TaskKind::Question), Duration::from_secs(2));
        assert_eq!(config.model_id_for(TaskKind::Emotion), "custom/emotion");
        assert_eq!(config.model_id_for(TaskKind::SpeechAct), "builtin/speech_act");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = EngineConfig::default();
        config.task_timeouts.insert(TaskKind::Task, Duration::ZERO);
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }
}
