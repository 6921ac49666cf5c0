use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::consts::{DEFAULT_REFERENCE_COLUMNS, MIN_PROFILE_LEN};
use crate::error::{CalibrationError, Result};
use crate::frame::{IntensityArray, ShiftProfile, TrendModel};
use crate::math::polyfit;

use super::correlation::estimate_shift;
use super::fourier_shift::shift_signal;

/// Which per-row shift is applied when straightening.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ShiftCorrection {
    /// Apply the linear trend fitted to the shift profile.
    #[default]
    Trend,
    /// Apply each row's own measured shift.
    Measured,
}

impl std::fmt::Display for ShiftCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trend => write!(f, "Trend"),
            Self::Measured => write!(f, "Measured"),
        }
    }
}

/// Parameters for spectral-line straightening.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraightenConfig {
    /// Reference row (default: `rows / 2`).
    pub reference_row: Option<usize>,
    /// Half-open column window used for registration (default: 500..1100),
    /// clipped to the image width.
    pub reference_columns: Option<(usize, usize)>,
    pub correction: ShiftCorrection,
    /// In `Measured` mode, rows deviating from the trend by more than this
    /// many columns are corrected with the trend instead.
    pub max_trend_residual: Option<f64>,
}

/// Output of [`straighten`].
#[derive(Clone, Debug)]
pub struct Straightened {
    /// The row-registered flat field.
    pub corrected: IntensityArray,
    /// Per-row shift relative to the reference row. Rows whose registration
    /// degenerated hold the trend prediction.
    pub shifts: ShiftProfile,
    pub trend: TrendModel,
    /// Rows whose registration degenerated.
    pub fallback_rows: Vec<usize>,
    pub reference_row: usize,
    pub reference_columns: (usize, usize),
}

/// Straighten the spectral lines of a flat field.
pub fn straighten(flat: &IntensityArray, config: &StraightenConfig) -> Result<Straightened> {
    straighten_with_progress(flat, config, |_, _| {})
}

/// Straighten the spectral lines of a flat field, reporting `(rows_done, rows)`
/// after every registered row.
pub fn straighten_with_progress<F>(
    flat: &IntensityArray,
    config: &StraightenConfig,
    mut on_row_done: F,
) -> Result<Straightened>
where
    F: FnMut(usize, usize),
{
    let (rows, cols) = flat.dim();
    if rows == 0 {
        return Err(CalibrationError::EmptySequence);
    }

    let reference_row = config.reference_row.unwrap_or(rows / 2);
    if reference_row >= rows {
        return Err(CalibrationError::InvalidReferenceRow {
            row: reference_row,
            rows,
        });
    }

    // The window is clipped to the image width, like a slice.
    let (start, requested_end) = config
        .reference_columns
        .unwrap_or(DEFAULT_REFERENCE_COLUMNS);
    let end = requested_end.min(cols);
    if start >= end || end - start < MIN_PROFILE_LEN {
        return Err(CalibrationError::InvalidColumnWindow {
            start,
            end: requested_end,
            width: cols,
        });
    }

    let reference = flat.slice(s![reference_row, start..end]).to_vec();

    let mut measured: Vec<Option<f64>> = Vec::with_capacity(rows);
    for row in 0..rows {
        let profile = flat.slice(s![row, start..end]).to_vec();
        let estimate = match estimate_shift(&reference, &profile) {
            Ok(shift) => Some(shift),
            Err(CalibrationError::DegenerateCorrelation(reason)) => {
                warn!(row, %reason, "Row registration degenerate, using trend");
                None
            }
            Err(e) => return Err(e),
        };
        measured.push(estimate);
        on_row_done(row + 1, rows);
    }

    let trend = fit_trend_sparse(&measured)?;
    let fallback_rows: Vec<usize> = measured
        .iter()
        .enumerate()
        .filter_map(|(row, m)| m.is_none().then_some(row))
        .collect();
    let shifts: ShiftProfile = measured
        .iter()
        .enumerate()
        .map(|(row, m)| m.unwrap_or_else(|| trend.predict(row)))
        .collect();

    let mut corrected = IntensityArray::zeros((rows, cols));
    for (row, mut out) in corrected.rows_mut().into_iter().enumerate() {
        let correction = corrective_shift(row, measured[row], &trend, config);
        let line = flat.row(row).to_vec();
        out.assign(&Array1::from(shift_signal(&line, correction)));
    }

    info!(
        rows,
        reference_row,
        slope = trend.slope,
        intercept = trend.intercept,
        fallback = fallback_rows.len(),
        "Spectral lines straightened"
    );

    Ok(Straightened {
        corrected,
        shifts,
        trend,
        fallback_rows,
        reference_row,
        reference_columns: (start, end),
    })
}

/// Fit a degree-1 trend of `shifts` against row index.
pub fn fit_trend(shifts: &[f64]) -> Result<TrendModel> {
    let rows: Vec<f64> = (0..shifts.len()).map(|r| r as f64).collect();
    fit_trend_points(&rows, shifts)
}

fn fit_trend_sparse(measured: &[Option<f64>]) -> Result<TrendModel> {
    let (rows, shifts): (Vec<f64>, Vec<f64>) = measured
        .iter()
        .enumerate()
        .filter_map(|(row, m)| m.map(|shift| (row as f64, shift)))
        .unzip();
    fit_trend_points(&rows, &shifts)
}

fn fit_trend_points(rows: &[f64], shifts: &[f64]) -> Result<TrendModel> {
    match shifts {
        [] => Err(CalibrationError::DegenerateCorrelation(
            "no row could be registered".into(),
        )),
        [only] => Ok(TrendModel::constant(*only)),
        _ => {
            let line = polyfit(rows, shifts, 1)?;
            Ok(TrendModel {
                slope: line.coeff(1),
                intercept: line.coeff(0),
            })
        }
    }
}

fn corrective_shift(
    row: usize,
    measured: Option<f64>,
    trend: &TrendModel,
    config: &StraightenConfig,
) -> f64 {
    let predicted = trend.predict(row);
    match (config.correction, measured) {
        (ShiftCorrection::Trend, _) | (ShiftCorrection::Measured, None) => predicted,
        (ShiftCorrection::Measured, Some(shift)) => match config.max_trend_residual {
            Some(limit) if (shift - predicted).abs() > limit => {
                debug!(row, shift, predicted, "Measured shift rejected against trend");
                predicted
            }
            _ => shift,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_of_single_point_is_constant() {
        let trend = fit_trend_sparse(&[None, Some(0.7), None]).unwrap();
        assert_eq!(trend, TrendModel::constant(0.7));
    }

    #[test]
    fn trend_needs_at_least_one_row() {
        assert!(fit_trend_sparse(&[None, None]).is_err());
    }

    #[test]
    fn measured_mode_rejects_outliers() {
        let trend = TrendModel {
            slope: 0.1,
            intercept: 0.0,
        };
        let config = StraightenConfig {
            correction: ShiftCorrection::Measured,
            max_trend_residual: Some(0.5),
            ..Default::default()
        };
        assert_eq!(corrective_shift(10, Some(1.2), &trend, &config), 1.2);
        assert_eq!(corrective_shift(10, Some(3.0), &trend, &config), 1.0);
        assert_eq!(corrective_shift(10, None, &trend, &config), 1.0);
    }
}
