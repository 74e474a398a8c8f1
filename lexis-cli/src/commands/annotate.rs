//! Annotate command implementation

use crate::config::CliConfig;
use crate::error::CliError;
use crate::input::{self, FileReader, InputDocument, STDIN_NAME};
use crate::output::{JsonFormatter, MarkdownFormatter, OutputFormatter, TextFormatter};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use lexis_api::{Analyzer, Config, DocumentAnnotation, TaskSet};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the annotate command
#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Input files or patterns (supports glob); reads stdin when omitted or `-`
    #[arg(value_name = "FILE/PATTERN")]
    pub input: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (default: from config, else text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Comma separated tasks, or `all`
    #[arg(short, long, value_name = "LIST")]
    pub tasks: Option<String>,

    /// Timeout for every classifier in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Resolve relative dates against this day (YYYY-MM-DD, default: today)
    #[arg(long, value_name = "DATE")]
    pub reference_date: Option<NaiveDate>,

    /// Configuration file
    #[arg(short, long, value_name = "FILE", env = "LEXIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip entity recognition
    #[arg(long)]
    pub no_entities: bool,

    /// Input is already split: every line is one sentence
    #[arg(long)]
    pub sentence_per_line: bool,

    /// Include per-stage timings
    #[arg(long)]
    pub benchmark: bool,

    /// Files annotated concurrently (default: number of CPUs)
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Compact JSON output
    #[arg(long)]
    pub compact: bool,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Sentences with their labels, one per line
    Text,
    /// Full document annotation as JSON
    Json,
    /// Markdown table per document
    Markdown,
}

impl OutputFormat {
    fn from_config(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(CliError::ConfigError(format!("unknown output format '{other}'")).into()),
        }
    }
}

impl AnnotateArgs {
    /// Execute the annotate command; `quiet` hides the progress bar
    pub fn execute(&self, quiet: bool) -> Result<()> {
        log::info!("Starting annotation");
        log::debug!("Arguments: {:?}", self);

        let cli_config = match &self.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig::default(),
        };
        let config = self.analyzer_config()?;
        let tasks = config.tasks().clone();
        let analyzer = Analyzer::with_config(config)?;

        let documents = self.read_inputs()?;
        let total = documents.len();
        let mut progress = ProgressReporter::new(quiet);
        progress.start(total as u64);

        let jobs = self.jobs.unwrap_or_else(num_cpus::get).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("Failed to start worker threads")?;
        let results: Vec<(String, lexis_api::error::Result<DocumentAnnotation>)> =
            pool.install(|| {
                documents
                    .into_par_iter()
                    .map(|doc| {
                        let result = analyzer.annotate_tasks(doc.input, &tasks);
                        progress.document_done(&doc.source, &result);
                        (doc.source, result)
                    })
                    .collect()
            });
        progress.finish();

        let format = match self.format {
            Some(format) => format,
            None => OutputFormat::from_config(&cli_config.output.default_format)?,
        };
        let pretty = cli_config.output.pretty_json && !self.compact;
        let mut formatter = self.formatter(format, pretty, total > 1)?;

        let mut failed = 0;
        for (source, result) in &results {
            match result {
                Ok(annotation) => formatter.format_document(source, annotation)?,
                Err(e) => {
                    failed += 1;
                    log::error!("{source}: {e}");
                }
            }
        }
        formatter.finish()?;

        if failed > 0 {
            return Err(CliError::AnnotationFailed { failed, total }.into());
        }
        log::info!("Annotated {total} input(s)");
        Ok(())
    }

    /// Config file first, then command-line overrides
    fn analyzer_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?,
            None => Config::default(),
        };

        let mut builder = base.into_builder();
        if let Some(list) = &self.tasks {
            let tasks = TaskSet::parse_list(list).map_err(|e| CliError::ConfigError(e.to_string()))?;
            builder = builder.tasks(tasks);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(date) = self.reference_date {
            builder = builder.reference_date(date);
        }
        if self.no_entities {
            builder = builder.entities(false);
        }
        if self.benchmark {
            builder = builder.benchmark(true);
        }
        Ok(builder.build()?)
    }

    fn read_inputs(&self) -> Result<Vec<InputDocument>> {
        let documents: Vec<InputDocument> = if input::wants_stdin(&self.input) {
            log::debug!("reading from standard input");
            vec![FileReader::read_stream(io::stdin().lock(), STDIN_NAME)?]
        } else {
            input::resolve_patterns(&self.input)?
                .iter()
                .map(|path| FileReader::read(path))
                .collect::<Result<_>>()?
        };
        if !self.sentence_per_line {
            return Ok(documents);
        }
        Ok(documents
            .into_iter()
            .map(InputDocument::sentence_per_line)
            .collect())
    }

    fn formatter(
        &self,
        format: OutputFormat,
        pretty: bool,
        many: bool,
    ) -> Result<Box<dyn OutputFormatter>> {
        let writer: Box<dyn Write + Send + Sync> = match &self.output {
            Some(path) => Box::new(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => Box::new(io::stdout()),
        };

        Ok(match format {
            OutputFormat::Text => Box::new(TextFormatter::new(writer).with_source_headers(many)),
            OutputFormat::Json => Box::new(JsonFormatter::new(writer).pretty(pretty)),
            OutputFormat::Markdown => Box::new(MarkdownFormatter::new(writer)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexis_api::TaskKind;

    fn args() -> AnnotateArgs {
        AnnotateArgs {
            input: vec![],
            output: None,
            format: None,
            tasks: None,
            timeout_ms: None,
            reference_date: None,
            config: None,
            no_entities: false,
            sentence_per_line: false,
            benchmark: false,
            jobs: None,
            compact: false,
        }
    }

    #[test]
    fn test_flags_override_config() {
        let config = AnnotateArgs {
            tasks: Some("date,question".to_string()),
            timeout_ms: Some(150),
            no_entities: true,
            benchmark: true,
            ..args()
        }
        .analyzer_config()
        .unwrap();

        assert_eq!(config.tasks(), &TaskSet::from([TaskKind::Date, TaskKind::Question]));
        assert_eq!(config.engine().default_timeout, Duration::from_millis(150));
        assert!(!config.engine().entities);
        assert!(config.engine().benchmark);
    }

    #[test]
    fn test_unknown_task_is_rejected() {
        let err = AnnotateArgs {
            tasks: Some("question,astrology".to_string()),
            ..args()
        }
        .analyzer_config()
        .unwrap_err();
        assert!(err.to_string().contains("astrology"));
    }

    #[test]
    fn test_format_from_config() {
        assert_eq!(OutputFormat::from_config("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_config("md").unwrap(), OutputFormat::Markdown);
        assert!(OutputFormat::from_config("yaml").is_err());
    }
}
