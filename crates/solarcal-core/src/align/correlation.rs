use crate::consts::{
    CORRELATION_CANDIDATES, CORRELATION_MARGIN, DEGENERATE_SCORE_SPREAD,
    FEATURELESS_ENERGY_RATIO, MIN_PROFILE_LEN,
};
use crate::error::{CalibrationError, Result};
use crate::math::{detrend, polyfit};

/// Estimate the sub-pixel shift of `target` relative to `reference`.
///
/// Both profiles are detrended, scored by sum of squared differences over
/// integer shifts -4..=+4, and the best candidate is refined by a parabola
/// fit over the four scores from one below to two above it.
///
/// A positive result means the target's features sit at higher column
/// indices than the reference's. Returns `DegenerateCorrelation` when the
/// either profile is featureless once detrended (saturated, blank or a pure
/// ramp) or the score curve has no usable minimum.
pub fn estimate_shift(reference: &[f64], target: &[f64]) -> Result<f64> {
    for profile in [reference, target] {
        if profile.len() < MIN_PROFILE_LEN {
            return Err(CalibrationError::ProfileTooShort {
                len: profile.len(),
                min: MIN_PROFILE_LEN,
            });
        }
    }

    let reference = featureful_residual(reference)?;
    let target = featureful_residual(target)?;

    let scores = correlation_scores(&reference, &target);
    check_scores(&scores)?;

    let peak = coarse_peak(&scores);
    refine_peak(&scores, peak)
}

/// SSD score for each integer candidate shift; index `s + 4` holds shift `s`.
pub fn correlation_scores(reference: &[f64], target: &[f64]) -> [f64; CORRELATION_CANDIDATES] {
    let margin = CORRELATION_MARGIN;
    let n = reference.len().min(target.len()) - 2 * margin;
    let window = &reference[margin..margin + n];

    let mut scores = [0.0; CORRELATION_CANDIDATES];
    for (idx, score) in scores.iter_mut().enumerate() {
        // idx == margin + shift, so the target window starts at margin + shift.
        let shifted = &target[idx..idx + n];
        *score = window
            .iter()
            .zip(shifted)
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
    }
    scores
}

/// Detrend `profile`, rejecting it when nothing but rounding noise remains.
fn featureful_residual(profile: &[f64]) -> Result<Vec<f64>> {
    let residual = detrend(profile)?;
    let raw_energy: f64 = profile.iter().map(|v| v * v).sum();
    let residual_energy: f64 = residual.iter().map(|v| v * v).sum();
    if !(residual_energy > FEATURELESS_ENERGY_RATIO * raw_energy) {
        return Err(CalibrationError::DegenerateCorrelation(
            "profile has no features after detrending".into(),
        ));
    }
    Ok(residual)
}

fn check_scores(scores: &[f64]) -> Result<()> {
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(CalibrationError::DegenerateCorrelation(
            "non-finite correlation score".into(),
        ));
    }
    let (lo, hi) = scores
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });
    if hi - lo <= DEGENERATE_SCORE_SPREAD * hi.max(f64::MIN_POSITIVE) {
        return Err(CalibrationError::DegenerateCorrelation(
            "flat correlation scores".into(),
        ));
    }
    Ok(())
}

/// Index of the lowest score, ignoring the two extreme candidates.
fn coarse_peak(scores: &[f64]) -> usize {
    let mut best = 1;
    for idx in 2..scores.len() - 1 {
        if scores[idx] < scores[best] {
            best = idx;
        }
    }
    best
}

fn refine_peak(scores: &[f64], peak: usize) -> Result<f64> {
    let lo = peak - 1;
    let hi = (peak + 2).min(scores.len() - 1);
    let x: Vec<f64> = (lo..=hi).map(|i| i as f64).collect();
    let parabola = polyfit(&x, &scores[lo..=hi], 2)?;

    let a = parabola.coeff(2);
    let b = parabola.coeff(1);
    if !(a > 0.0) {
        return Err(CalibrationError::DegenerateCorrelation(format!(
            "correlation parabola has no minimum (curvature {a:e})"
        )));
    }

    let shift = -b / (2.0 * a) - CORRELATION_MARGIN as f64;
    if !shift.is_finite() || shift.abs() > CORRELATION_MARGIN as f64 {
        return Err(CalibrationError::DegenerateCorrelation(format!(
            "refined shift {shift} outside the search range"
        )));
    }
    Ok(shift)
}
