//! Input handling module

pub mod file_reader;
pub mod glob_resolver;

pub use file_reader::{FileReader, InputDocument};
pub use glob_resolver::resolve_patterns;

/// Name shown for text read from standard input
pub const STDIN_NAME: &str = "<stdin>";

/// Whether the arguments ask for standard input
pub fn wants_stdin(patterns: &[String]) -> bool {
    patterns.is_empty() || patterns.iter().all(|p| p == "-")
}
