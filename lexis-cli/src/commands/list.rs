//! List command implementation

use super::ListCommands;
use anyhow::Result;
use lexis_api::TaskKind;
use std::io::Write;

/// Print the requested listing
pub fn execute(subcommand: &ListCommands, out: &mut impl Write) -> Result<()> {
    match subcommand {
        ListCommands::Tasks => {
            writeln!(out, "Available tasks:")?;
            for task in TaskKind::ALL {
                writeln!(out, "  {:<11} {}", task.as_str(), task.description())?;
                if !task.labels().is_empty() {
                    writeln!(out, "  {:<11} labels: {}", "", task.labels().join(", "))?;
                }
            }
        }
        ListCommands::Formats => {
            writeln!(out, "Available output formats:")?;
            writeln!(out, "  text      Sentences with their labels, one per line")?;
            writeln!(out, "  json      Full document annotation as JSON")?;
            writeln!(out, "  markdown  Markdown table per document")?;
        }
    }
    out.flush()?;
    Ok(())
}
