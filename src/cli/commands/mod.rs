//! Command implementations for the headertest CLI
//!
//! Each command lives in its own module.

pub mod check;
pub mod config;
pub mod list;

use anyhow::Result;

use crate::config::{HeaderTestConfig, Settings};
use crate::discovery::HeaderDiscovery;

/// Headers named on the command line, or everything found in the include directories
pub(crate) fn select_headers(explicit: &[String], settings: &Settings) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit.to_vec());
    }
    let discovery = HeaderDiscovery::new(&settings.extensions, &settings.exclude, settings.recursive)?;
    Ok(discovery.discover_all(&settings.include_dirs))
}

pub(crate) fn load_settings<T: serde::Serialize>(
    config_path: Option<&str>,
    overrides: Option<T>,
) -> Result<Settings> {
    let config = HeaderTestConfig::load_with(config_path, overrides)?;
    config.settings()
}
