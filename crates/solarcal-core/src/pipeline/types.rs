use std::path::PathBuf;

use crate::align::Straightened;

/// Calibration processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CalibrationStage {
    Reading,
    Averaging,
    Registration,
    Writing,
    Converting,
}

impl std::fmt::Display for CalibrationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading exposures"),
            Self::Averaging => write!(f, "Averaging"),
            Self::Registration => write!(f, "Registering rows"),
            Self::Writing => write!(f, "Writing output"),
            Self::Converting => write!(f, "Converting exposures"),
        }
    }
}

/// Progress reporting for calibration runs.
///
/// Implementors can use this to drive progress bars or logging. All methods
/// have default no-op implementations.
pub trait ProgressReporter {
    /// A new stage has started. `total_items` is the number of work items in
    /// this stage (exposures, rows), if known.
    fn begin_stage(&self, _stage: CalibrationStage, _total_items: Option<usize>) {}

    /// `items_done` work items within the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Reporter that ignores all progress.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Outcome of building one master frame.
#[derive(Clone, Debug)]
pub struct MasterReport {
    pub path: PathBuf,
    pub shape: (usize, usize),
    /// Exposures that were averaged.
    pub exposures: usize,
    /// Files that matched but could not be decoded.
    pub skipped: Vec<PathBuf>,
    /// Row registration diagnostics (flat master only).
    pub registration: Option<Straightened>,
}

/// Outcome of transcoding raw exposures to calibration frames.
#[derive(Clone, Debug, Default)]
pub struct ConversionReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}
