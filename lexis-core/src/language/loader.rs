//! Language table loader
//!
//! Manages the embedded language tables with caching.

use std::sync::{Arc, OnceLock};

use crate::error::{CoreError, Result};
use crate::language::{config::LanguageConfig, tables::LanguageTables};

/// Embedded English tables
static ENGLISH: OnceLock<std::result::Result<Arc<LanguageTables>, String>> = OnceLock::new();

/// Load language tables from a TOML string
pub fn from_toml_str(toml_str: &str) -> Result<LanguageTables> {
    let config: LanguageConfig = toml::from_str(toml_str)
        .map_err(|e| CoreError::LanguageConfig(format!("failed to parse language config: {e}")))?;
    LanguageTables::from_config(&config).map_err(CoreError::LanguageConfig)
}

/// Load tables by language code
pub fn get_tables(code: &str) -> Result<Arc<LanguageTables>> {
    match code {
        "en" | "english" => try_english(),
        _ => Err(CoreError::LanguageConfig(format!(
            "Unknown language code: {code}"
        ))),
    }
}

/// Embedded English tables, parsed on first access
pub fn try_english() -> Result<Arc<LanguageTables>> {
    ENGLISH
        .get_or_init(|| {
            log::debug!("Loading embedded English language tables");
            from_toml_str(include_str!("../../configs/english.toml"))
                .map(Arc::new)
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(CoreError::LanguageConfig)
}

/// Embedded English tables
///
/// # Panics
///
/// Panics if the embedded table file is invalid, which the test suite rules out.
pub fn english() -> Arc<LanguageTables> {
    try_english().expect("embedded English tables should always be valid")
}
