//! High-level configuration API

use crate::error::{ApiError, Result};
use chrono::NaiveDate;
use lexis_engine::{EngineConfig, TaskKind, TaskSet};
use std::time::Duration;

/// High-level configuration for annotation
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    engine: EngineConfig,
    tasks: TaskSet,
    threads: Option<usize>,
    reference_date: Option<NaiveDate>,
    abbreviations: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            tasks: TaskSet::all(),
            threads: None,
            reference_date: None,
            abbreviations: Vec::new(),
        }
    }
}

impl Config {
    /// Create a fast configuration
    pub fn fast() -> Self {
        Self {
            engine: EngineConfig::fast(),
            ..Self::default()
        }
    }

    /// Create a configuration that waits longer for every model
    pub fn accurate() -> Self {
        Self {
            engine: EngineConfig::accurate(),
            ..Self::default()
        }
    }

    /// Create a balanced configuration
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Create a builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Builder starting from this configuration, for applying overrides
    pub fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder { config: self }
    }

    /// Engine settings
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Tasks run when a call does not name any
    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    /// Runtime worker threads (`None` = one per core)
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Fixed reference date (`None` = today)
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }

    /// Abbreviations added to the built-in English tables
    pub fn abbreviations(&self) -> &[String] {
        &self.abbreviations
    }

    /// Parse a TOML configuration
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: file::ConfigFile =
            toml::from_str(source).map_err(|e| ApiError::Config(e.to_string()))?;
        file.into_builder()?.build()
    }

    /// Load a TOML configuration file
    #[cfg(feature = "serde")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::debug!("loaded configuration from {}", path.display());
        Self::from_toml_str(&source)
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the tasks run by default
    pub fn tasks(mut self, tasks: TaskSet) -> Self {
        self.config.tasks = tasks;
        self
    }

    /// Set the default tasks from a list such as `question,sentiment`
    pub fn task_list(mut self, list: &str) -> Result<Self> {
        self.config.tasks = TaskSet::parse_list(list).map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(self)
    }

    /// Set the timeout applied to every model without an override
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.engine.default_timeout = timeout;
        self
    }

    /// Set the timeout for one task
    pub fn task_timeout(mut self, task: TaskKind, timeout: Duration) -> Self {
        self.config.engine.task_timeouts.insert(task, timeout);
        self
    }

    /// Choose the model id for one task
    pub fn model(mut self, task: TaskKind, model_id: impl Into<String>) -> Self {
        self.config.engine.model_ids.insert(task, model_id.into());
        self
    }

    /// Enable or disable entity recognition
    pub fn entities(mut self, enabled: bool) -> Self {
        self.config.engine.entities = enabled;
        self
    }

    /// Set runtime worker thread count
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.config.threads = threads;
        self
    }

    /// Sentence count above which tagging runs in parallel
    pub fn parallel_threshold(mut self, sentences: usize) -> Self {
        self.config.engine.parallel_threshold = sentences;
        self
    }

    /// Largest accepted input in bytes
    pub fn max_input_bytes(mut self, bytes: usize) -> Self {
        self.config.engine.max_input_bytes = bytes;
        self
    }

    /// Number of linguistic analyses to cache (0 disables the cache)
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.cache_capacity = capacity;
        self
    }

    /// Report per-stage timings in the output
    pub fn benchmark(mut self, enabled: bool) -> Self {
        self.config.engine.benchmark = enabled;
        self
    }

    /// Resolve relative dates against a fixed day
    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.config.reference_date = Some(date);
        self
    }

    /// Add abbreviations to the sentence splitter
    pub fn abbreviations<I, S>(mut self, abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .abbreviations
            .extend(abbreviations.into_iter().map(Into::into));
        self
    }

    /// Use the fast engine preset, keeping other settings
    pub fn fast(mut self) -> Self {
        self.config.engine = EngineConfig::fast();
        self
    }

    /// Use the accurate engine preset, keeping other settings
    pub fn accurate(mut self) -> Self {
        self.config.engine = EngineConfig::accurate();
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if self.config.threads == Some(0) {
            return Err(ApiError::Config("thread count must be at least 1".to_string()));
        }
        self.config.engine.validate()?;
        Ok(self.config)
    }
}

#[cfg(feature = "serde")]
mod file {
    //! On-disk TOML layout

    use super::ConfigBuilder;
    use crate::error::{ApiError, Result};
    use lexis_engine::{TaskKind, TaskSet};
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Debug, Default, Deserialize)]
    pub(super) struct ConfigFile {
        #[serde(default)]
        analysis: AnalysisSection,
        #[serde(default)]
        timeouts: TimeoutSection,
        #[serde(default)]
        models: BTreeMap<String, String>,
        #[serde(default)]
        performance: PerformanceSection,
    }

    #[derive(Debug, Default, Deserialize)]
    struct AnalysisSection {
        tasks: Option<Vec<String>>,
        entities: Option<bool>,
        reference_date: Option<chrono::NaiveDate>,
        #[serde(default)]
        abbreviations: Vec<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    struct TimeoutSection {
        default_ms: Option<u64>,
        #[serde(default)]
        tasks: BTreeMap<String, u64>,
    }

    #[derive(Debug, Default, Deserialize)]
    struct PerformanceSection {
        /// 0 = one per core
        threads: Option<usize>,
        parallel_threshold: Option<usize>,
        cache_capacity: Option<usize>,
        max_input_bytes: Option<usize>,
        benchmark: Option<bool>,
    }

    fn task(name: &str) -> Result<TaskKind> {
        name.parse().map_err(|e| ApiError::Config(format!("{e}")))
    }

    impl ConfigFile {
        pub(super) fn into_builder(self) -> Result<ConfigBuilder> {
            let mut builder = ConfigBuilder::default();

            let analysis = self.analysis;
            if let Some(names) = analysis.tasks {
                let tasks: TaskSet = TaskSet::parse_list(&names.join(","))
                    .map_err(|e| ApiError::Config(e.to_string()))?;
                builder = builder.tasks(tasks);
            }
            if let Some(entities) = analysis.entities {
                builder = builder.entities(entities);
            }
            if let Some(date) = analysis.reference_date {
                builder = builder.reference_date(date);
            }
            builder = builder.abbreviations(analysis.abbreviations);

            if let Some(ms) = self.timeouts.default_ms {
                builder = builder.timeout(Duration::from_millis(ms));
            }
            for (name, ms) in self.timeouts.tasks {
                builder = builder.task_timeout(task(&name)?, Duration::from_millis(ms));
            }
            for (name, model_id) in self.models {
                builder = builder.model(task(&name)?, model_id);
            }

            let perf = self.performance;
            if let Some(threads) = perf.threads {
                builder = builder.threads((threads > 0).then_some(threads));
            }
            if let Some(threshold) = perf.parallel_threshold {
                builder = builder.parallel_threshold(threshold);
            }
            if let Some(capacity) = perf.cache_capacity {
                builder = builder.cache_capacity(capacity);
            }
            if let Some(bytes) = perf.max_input_bytes {
                builder = builder.max_input_bytes(bytes);
            }
            if let Some(benchmark) = perf.benchmark {
                builder = builder.benchmark(benchmark);
            }
            Ok(builder)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_validates() {
        assert!(Config::builder().threads(Some(0)).build().is_err());
        assert!(Config::builder().timeout(Duration::ZERO).build().is_err());
        assert!(Config::builder().task_list("question,mood").is_err());
    }

    #[test]
    fn test_builder_sets_engine_fields() {
        let config = Config::builder()
            .task_list("question, date")
            .unwrap()
            .task_timeout(TaskKind::Date, Duration::from_millis(250))
            .entities(false)
            .benchmark(true)
            .build()
            .unwrap();

        assert_eq!(config.tasks(), &TaskSet::from([TaskKind::Question, TaskKind::Date]));
        assert_eq!(config.engine().timeout_for(TaskKind::Date), Duration::from_millis(250));
        assert!(!config.engine().entities);
        assert!(config.engine().benchmark);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [analysis]
            tasks = ["sentiment", "speech_act"]
            entities = false
            reference_date = "2024-03-04"
            abbreviations = ["approx"]

            [timeouts]
            default_ms = 800

            [timeouts.tasks]
            sentiment = 100

            [models]
            emotion = "builtin/emotion"

            [performance]
            threads = 0
            cache_capacity = 32
            "#,
        )
        .unwrap();

        assert_eq!(config.tasks(), &TaskSet::from([TaskKind::Sentiment, TaskKind::SpeechAct]));
        assert_eq!(config.engine().default_timeout, Duration::from_millis(800));
        assert_eq!(config.engine().timeout_for(TaskKind::Sentiment), Duration::from_millis(100));
        assert_eq!(config.engine().model_id_for(TaskKind::Emotion), "builtin/emotion");
        assert_eq!(config.engine().cache_capacity, 32);
        assert_eq!(config.threads(), None);
        assert_eq!(config.reference_date(), NaiveDate::from_ymd_opt(2024, 3, 4));
        assert_eq!(config.abbreviations(), ["approx"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml_rejects_unknown_task() {
        let err = Config::from_toml_str("[timeouts.tasks]\nhoroscope = 10\n").unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }
}
