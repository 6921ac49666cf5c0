use std::f64::consts::TAU;

use num_complex::Complex;
use rustfft::FftPlanner;

/// Discrete frequency bins in cycles per sample, in standard FFT order:
/// `[0, 1, ..., ceil(n/2) - 1, -floor(n/2), ..., -1] / n`.
pub fn fft_frequencies(n: usize) -> Vec<f64> {
    let positive = n.div_ceil(2);
    (0..n)
        .map(|k| {
            let k = if k < positive {
                k as f64
            } else {
                k as f64 - n as f64
            };
            k / n as f64
        })
        .collect()
}

/// Shift a signal by a (possibly fractional) number of samples using the
/// Fourier delay theorem.
///
/// Every bin is multiplied by `exp(i * 2pi * shift * f)`, so the output is
/// `out[n] = in[n + shift]` with circular wrap-around: content moves toward
/// lower indices by `shift`. The imaginary residual of the inverse transform
/// is discarded.
pub fn shift_signal(signal: &[f64], shift: f64) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || shift == 0.0 {
        return signal.to_vec();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut spectrum);

    for (bin, freq) in spectrum.iter_mut().zip(fft_frequencies(n)) {
        *bin *= Complex::from_polar(1.0, TAU * shift * freq);
    }

    ifft.process(&mut spectrum);

    let scale = 1.0 / n as f64;
    spectrum.iter().map(|c| c.re * scale).collect()
}
