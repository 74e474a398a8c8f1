//! CLI command implementations

use clap::{Parser, Subcommand};

pub mod annotate;
pub mod generate_config;
pub mod list;

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = "lexis")]
#[command(about = "Annotate text with sentences, tags, entities, dates, tasks and sentiment")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors; no progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Annotate text files or standard input
    Annotate(annotate::AnnotateArgs),

    /// List available components
    List {
        #[command(subcommand)]
        subcommand: ListCommands,
    },

    /// Print or write a commented configuration file
    GenerateConfig(generate_config::GenerateConfigArgs),
}

/// List subcommands
#[derive(Debug, Subcommand)]
pub enum ListCommands {
    /// List classification tasks and their labels
    Tasks,

    /// List available output formats
    Formats,
}

impl Cli {
    /// Log level selected by the flags
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Initialize logging based on verbosity
    pub fn init_logging(&self) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(self.log_level()))
            .init();
    }

    /// Run the selected command
    pub fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Annotate(args) => args.execute(self.quiet),
            Commands::List { subcommand } => list::execute(subcommand, &mut std::io::stdout()),
            Commands::GenerateConfig(args) => args.execute(),
        }
    }
}
