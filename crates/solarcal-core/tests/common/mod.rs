#![allow(dead_code)]

use std::path::Path;

use image::{GrayImage, Luma};
use ndarray::Array2;
use solarcal_core::align::shift_signal;
use solarcal_core::frame::IntensityArray;

fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let d = (x - center) / sigma;
    (-0.5 * d * d).exp()
}

/// Synthetic spectral profile on a unit continuum: an absorption line and an
/// emission feature of equal area, so a pure translation leaves the linear
/// baseline unchanged. `offset` moves both features toward higher indices.
pub fn spectral_profile(len: usize, offset: f64) -> Vec<f64> {
    let c1 = len as f64 * 0.4 + offset;
    let c2 = len as f64 * 0.6 + offset;
    (0..len)
        .map(|i| {
            let x = i as f64;
            1.0 - 0.5 * gaussian(x, c1, 3.0) + 0.5 * gaussian(x, c2, 3.0)
        })
        .collect()
}

/// Flat field whose row `j` is the base profile displaced by `slope * j`
/// columns (applied with the Fourier shifter).
pub fn curved_flat(rows: usize, cols: usize, slope: f64) -> IntensityArray {
    let base = spectral_profile(cols, 0.0);
    let mut flat = Array2::<f64>::zeros((rows, cols));
    for (j, mut row) in flat.rows_mut().into_iter().enumerate() {
        let displaced = shift_signal(&base, -slope * j as f64);
        for (dst, src) in row.iter_mut().zip(displaced) {
            *dst = src;
        }
    }
    flat
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Write an 8-bit grayscale PNG of constant value.
pub fn write_constant_png(path: &Path, width: u32, height: u32, value: u8) {
    let img = GrayImage::from_pixel(width, height, Luma([value]));
    img.save(path).expect("write png");
}

/// Write an 8-bit grayscale PNG with every row equal to `row_values`.
pub fn write_row_pattern_png(path: &Path, height: u32, row_values: &[f64]) {
    let width = row_values.len() as u32;
    let img = GrayImage::from_fn(width, height, |x, _| {
        Luma([(row_values[x as usize].clamp(0.0, 1.0) * 255.0).round() as u8])
    });
    img.save(path).expect("write png");
}
