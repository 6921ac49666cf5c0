use crate::error::{CalibrationError, Result};
use crate::frame::IntensityArray;

/// Pixel-wise mean of equally shaped arrays.
///
/// Every shape is checked before any accumulation, so a mismatch never
/// yields a partial average.
pub fn mean_stack(frames: &[IntensityArray]) -> Result<IntensityArray> {
    let first = frames.first().ok_or(CalibrationError::EmptySequence)?;
    check_shapes(first.dim(), frames)?;

    let n = frames.len() as f64;
    let mut sum = IntensityArray::zeros(first.dim());
    for frame in frames {
        sum += frame;
    }
    sum /= n;

    Ok(sum)
}

/// Fail with `ShapeMismatch` on the first array whose shape differs from `expected`.
pub fn check_shapes(expected: (usize, usize), frames: &[IntensityArray]) -> Result<()> {
    match frames.iter().find(|f| f.dim() != expected) {
        Some(bad) => Err(CalibrationError::ShapeMismatch {
            expected,
            found: bad.dim(),
        }),
        None => Ok(()),
    }
}
