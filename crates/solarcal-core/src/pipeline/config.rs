use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::StraightenConfig;
use crate::consts::{
    DEFAULT_BIT_FACTOR, DEFAULT_DARK_FILENAME, DEFAULT_DARK_SEARCH, DEFAULT_FLAT_FILENAME,
    DEFAULT_FLAT_SEARCH, DEFAULT_RAW_EXTENSION,
};
use crate::error::{CalibrationError, Result};
use crate::io::ExposureFilter;

/// Complete calibration run configuration, loadable from TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Scale applied to normalized exposures (8-bit convention: 255).
    pub bit_factor: f64,
    /// Raw exposure file extensions, matched case-insensitively.
    pub extensions: Vec<String>,
    pub dark: MasterSelection,
    pub flat: MasterSelection,
    pub straighten: StraightenConfig,
}

/// Which raw files feed a master frame and where the master is written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MasterSelection {
    /// Case-insensitive substring a raw filename must contain.
    pub search_string: String,
    /// Output filename inside the output directory.
    pub filename: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            bit_factor: DEFAULT_BIT_FACTOR,
            extensions: vec![DEFAULT_RAW_EXTENSION.to_string()],
            dark: MasterSelection {
                search_string: DEFAULT_DARK_SEARCH.to_string(),
                filename: DEFAULT_DARK_FILENAME.to_string(),
            },
            flat: MasterSelection {
                search_string: DEFAULT_FLAT_SEARCH.to_string(),
                filename: DEFAULT_FLAT_FILENAME.to_string(),
            },
            straighten: StraightenConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CalibrationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CalibrationError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bit_factor.is_finite() && self.bit_factor > 0.0) {
            return Err(CalibrationError::Config(format!(
                "bit_factor must be positive, got {}",
                self.bit_factor
            )));
        }
        if self.extensions.is_empty() {
            return Err(CalibrationError::Config(
                "at least one raw file extension is required".into(),
            ));
        }
        for selection in [&self.dark, &self.flat] {
            if selection.filename.trim().is_empty() {
                return Err(CalibrationError::Config(
                    "master filename must not be empty".into(),
                ));
            }
        }
        if let Some(limit) = self.straighten.max_trend_residual {
            if !(limit >= 0.0) {
                return Err(CalibrationError::Config(format!(
                    "max_trend_residual must be non-negative, got {limit}"
                )));
            }
        }
        Ok(())
    }

    pub fn dark_filter(&self) -> ExposureFilter {
        ExposureFilter::new(&self.dark.search_string, &self.extensions)
    }

    pub fn flat_filter(&self) -> ExposureFilter {
        ExposureFilter::new(&self.flat.search_string, &self.extensions)
    }
}
