pub mod correlation;
pub mod fourier_shift;
pub mod straighten;

pub use correlation::estimate_shift;
pub use fourier_shift::shift_signal;
pub use straighten::{
    fit_trend, straighten, straighten_with_progress, ShiftCorrection, StraightenConfig,
    Straightened,
};
