use std::path::Path;

use chrono::{DateTime, Local};
use ndarray::Array2;

use crate::consts::{LUMINANCE_B, LUMINANCE_G, LUMINANCE_R};
use crate::error::{CalibrationError, Result};
use crate::frame::IntensityArray;

/// Load a raster image as single-channel intensity in [0.0, 1.0].
///
/// Colour images are reduced with BT.709 luminance weights; alpha is
/// dropped. Grayscale images keep their normalized value.
pub fn load_grayscale(path: &Path) -> Result<IntensityArray> {
    let img = image::open(path)?;
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut data = Array2::<f64>::zeros((h, w));

    if img.color().has_color() {
        let rgb = img.to_rgb32f();
        for (col, row, pixel) in rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            data[[row as usize, col as usize]] =
                LUMINANCE_R * r as f64 + LUMINANCE_G * g as f64 + LUMINANCE_B * b as f64;
        }
    } else {
        let gray = img.to_luma32f();
        for (col, row, pixel) in gray.enumerate_pixels() {
            data[[row as usize, col as usize]] = pixel.0[0] as f64;
        }
    }

    Ok(data)
}

/// Load an exposure scaled by `bit_factor`, optionally subtracting a dark master.
pub fn load_exposure(
    path: &Path,
    dark_master: Option<&IntensityArray>,
    bit_factor: f64,
) -> Result<IntensityArray> {
    let scaled = load_grayscale(path)? * bit_factor;
    match dark_master {
        Some(dark) => {
            if dark.dim() != scaled.dim() {
                return Err(CalibrationError::ShapeMismatch {
                    expected: dark.dim(),
                    found: scaled.dim(),
                });
            }
            Ok(scaled - dark)
        }
        None => Ok(scaled),
    }
}

/// Creation time of a file, falling back to its modification time on
/// filesystems without birth times.
pub fn file_creation_time(path: &Path) -> Result<DateTime<Local>> {
    let meta = std::fs::metadata(path)?;
    let time = meta.created().or_else(|_| meta.modified())?;
    Ok(DateTime::<Local>::from(time))
}

/// Timestamp in the `YYYY-MM-DDTHH:MM:SS.ffffff` form written to `OBSTIME`.
pub fn iso_timestamp(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
