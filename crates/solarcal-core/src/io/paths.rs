use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::DEFAULT_RAW_EXTENSION;
use crate::error::{CalibrationError, Result};

/// Selects raw exposures by case-insensitive filename substring and extension.
#[derive(Clone, Debug)]
pub struct ExposureFilter {
    search: String,
    extensions: Vec<String>,
}

impl ExposureFilter {
    pub fn new(search: &str, extensions: &[String]) -> Self {
        Self {
            search: search.to_lowercase(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Match on extension only.
    pub fn any(extensions: &[String]) -> Self {
        Self::new("", extensions)
    }

    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.contains(&e.to_lowercase()));
        ext_ok && name.to_lowercase().contains(&self.search)
    }
}

impl Default for ExposureFilter {
    fn default() -> Self {
        Self::any(&[DEFAULT_RAW_EXTENSION.to_string()])
    }
}

/// A directory of raw exposures, validated once on open.
#[derive(Clone, Debug)]
pub struct RawDirectory {
    root: PathBuf,
}

impl RawDirectory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CalibrationError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// All files below the root (recursively) accepted by `filter`, sorted by path.
    pub fn find(&self, filter: &ExposureFilter) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                } else if path.is_file() && filter.matches(&path) {
                    found.push(path);
                }
            }
        }
        found.sort();
        Ok(found)
    }
}

/// Output directory for calibration frames.
#[derive(Clone, Debug)]
pub struct OutputDirectory {
    root: PathBuf,
}

impl OutputDirectory {
    /// Create the directory (and parents) if missing. Idempotent.
    pub fn ensure(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        if !root.is_dir() {
            return Err(CalibrationError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}
