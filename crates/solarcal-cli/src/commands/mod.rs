pub mod calibrate;
pub mod config;
pub mod convert;

use std::path::Path;

use anyhow::{Context, Result};
use solarcal_core::pipeline::config::CalibrationConfig;

/// Load the config file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&Path>) -> Result<CalibrationConfig> {
    match path {
        Some(path) => CalibrationConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CalibrationConfig::default()),
    }
}
