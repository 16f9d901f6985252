//! Application settings loaded from `bursar.toml`.
//!
//! The settings file carries the school identity used when composing reminder
//! text, plus an optional database URL override. The file is optional; the
//! daily job falls back to defaults so a bare checkout still runs.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Settings parsed from `bursar.toml`
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// School name rendered into reminder messages
    pub school_name: String,
    /// Optional database URL override; the environment wins otherwise
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            school_name: "The School".to_string(),
            database_url: None,
        }
    }
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns a `Config` error when the file cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse bursar.toml: {e}"),
    })
}

/// Loads `./bursar.toml`, falling back to defaults when the file is absent.
#[must_use]
pub fn load_or_default() -> Settings {
    match load_settings("bursar.toml") {
        Ok(settings) => settings,
        Err(e) => {
            info!("No usable bursar.toml ({e}); using default settings");
            Settings::default()
        }
    }
}
