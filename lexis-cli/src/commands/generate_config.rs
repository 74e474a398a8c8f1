//! Generate config command implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the generate-config command
#[derive(Debug, Args)]
pub struct GenerateConfigArgs {
    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Commented configuration with every default spelled out
pub const TEMPLATE: &str = r#"# Lexis configuration

[analysis]
# Tasks run when --tasks is not given: speech_act, question, emotion,
# sarcasm, sentiment, date, task, or "all"
tasks = ["all"]

# Run the entity recognizer (DATE entities also anchor date resolution)
entities = true

# Resolve relative dates against a fixed day instead of today
# reference_date = "2024-03-04"

# Extra abbreviations that should not end a sentence
abbreviations = []

[timeouts]
# Per-classifier timeout in milliseconds
default_ms = 2000

# Per-task overrides
[timeouts.tasks]
# sentiment = 500

# Model id per task; the built-in models are "builtin/<task>"
[models]
# emotion = "builtin/emotion"

[performance]
# Runtime worker threads (0 = one per core)
threads = 0

# Sentence count above which tagging runs in parallel
parallel_threshold = 32

# Linguistic analyses kept in memory for repeated texts (0 = off)
cache_capacity = 0

# Largest accepted input in bytes
max_input_bytes = 10485760

# Report per-stage timings
benchmark = false

[output]
# text, json or markdown
default_format = "text"
pretty_json = true
"#;

impl GenerateConfigArgs {
    /// Execute the generate-config command
    pub fn execute(&self) -> Result<()> {
        let Some(path) = &self.output else {
            print!("{TEMPLATE}");
            return Ok(());
        };

        if path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }
        std::fs::write(path, TEMPLATE)
            .with_context(|| format!("Failed to write to {}", path.display()))?;

        println!("✓ Configuration written to {}", path.display());
        println!("Use it with: lexis annotate --config {} <FILE>", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CliConfig;
    use tempfile::TempDir;

    #[test]
    fn test_template_is_the_default_config() {
        let config = lexis_api::Config::from_toml_str(TEMPLATE).unwrap();
        assert_eq!(config, lexis_api::Config::default());
        assert_eq!(CliConfig::from_toml_str(TEMPLATE).unwrap(), CliConfig::default());
    }

    #[test]
    fn test_execute_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("lexis.toml");

        let args = GenerateConfigArgs {
            output: Some(output_path.clone()),
            force: false,
        };
        args.execute().unwrap();
        assert_eq!(std::fs::read_to_string(&output_path).unwrap(), TEMPLATE);

        // second run refuses to clobber the file
        assert!(args.execute().is_err());
        GenerateConfigArgs {
            output: Some(output_path),
            force: true,
        }
        .execute()
        .unwrap();
    }
}
