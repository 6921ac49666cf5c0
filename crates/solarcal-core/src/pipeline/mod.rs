pub mod config;
mod masters;
mod types;

pub use masters::{
    convert_exposures, generate_master_dark, generate_master_flat, write_shift_profile,
};
pub use types::{CalibrationStage, ConversionReport, MasterReport, NoOpReporter, ProgressReporter};
