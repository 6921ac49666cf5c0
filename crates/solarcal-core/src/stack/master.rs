use tracing::debug;

use crate::error::Result;
use crate::frame::IntensityArray;

use super::mean::{check_shapes, mean_stack};

/// Average normalized dark exposures and scale by `bit_factor`.
pub fn build_dark_master(exposures: &[IntensityArray], bit_factor: f64) -> Result<IntensityArray> {
    let mean = mean_stack(exposures)?;
    debug!(count = exposures.len(), bit_factor, "Dark master averaged");
    Ok(mean * bit_factor)
}

/// Average `exposure * bit_factor - dark` over normalized flat exposures.
pub fn build_flat_master(
    exposures: &[IntensityArray],
    dark_master: &IntensityArray,
    bit_factor: f64,
) -> Result<IntensityArray> {
    check_shapes(dark_master.dim(), exposures)?;

    let calibrated: Vec<IntensityArray> = exposures
        .iter()
        .map(|exposure| exposure * bit_factor - dark_master)
        .collect();
    let mean = mean_stack(&calibrated)?;
    debug!(count = exposures.len(), bit_factor, "Flat master averaged");
    Ok(mean)
}
