use crate::consts::SINGULAR_PIVOT;
use crate::error::{CalibrationError, Result};

/// Polynomial with coefficients stored lowest power first.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    pub coeffs: Vec<f64>,
}

impl Polynomial {
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Coefficient of `x^power`, zero when absent.
    pub fn coeff(&self, power: usize) -> f64 {
        self.coeffs.get(power).copied().unwrap_or(0.0)
    }

    /// Evaluate with Horner's scheme.
    pub fn eval(&self, x: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }
}

/// Least-squares polynomial fit of `y` against `x`.
///
/// The abscissae are centered and scaled to [-1, 1] before the normal
/// equations are formed, then the solution is mapped back to the caller's
/// coordinates. Fails with `DegenerateCorrelation` when there are fewer
/// points than coefficients or the system is singular.
pub fn polyfit(x: &[f64], y: &[f64], degree: usize) -> Result<Polynomial> {
    let n_coeffs = degree + 1;
    if x.len() != y.len() {
        return Err(CalibrationError::ShapeMismatch {
            expected: (x.len(), 1),
            found: (y.len(), 1),
        });
    }
    if x.len() < n_coeffs {
        return Err(CalibrationError::DegenerateCorrelation(format!(
            "{} points cannot determine a degree-{degree} polynomial",
            x.len()
        )));
    }

    let (x_min, x_max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let center = 0.5 * (x_min + x_max);
    let half_span = 0.5 * (x_max - x_min);
    let scale = if half_span > 0.0 { half_span } else { 1.0 };

    // Power sums S_k = sum t^k for k in 0..=2*degree, and moments sum y t^k.
    let mut power_sums = vec![0.0f64; 2 * degree + 1];
    let mut moments = vec![0.0f64; n_coeffs];
    for (&xi, &yi) in x.iter().zip(y) {
        let t = (xi - center) / scale;
        let mut tk = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += tk;
            if k < n_coeffs {
                moments[k] += yi * tk;
            }
            tk *= t;
        }
    }

    let mut matrix: Vec<Vec<f64>> = (0..n_coeffs)
        .map(|row| (0..n_coeffs).map(|col| power_sums[row + col]).collect())
        .collect();
    let scaled = solve_linear(&mut matrix, &mut moments)?;

    Ok(Polynomial {
        coeffs: unscale(&scaled, center, scale),
    })
}

/// Subtract the degree-1 least-squares fit against the sample index.
pub fn detrend(profile: &[f64]) -> Result<Vec<f64>> {
    let index: Vec<f64> = (0..profile.len()).map(|i| i as f64).collect();
    let line = polyfit(&index, profile, 1)?;
    Ok(index
        .iter()
        .zip(profile)
        .map(|(&i, &v)| v - line.eval(i))
        .collect())
}

/// Gaussian elimination with partial pivoting. Consumes `a` and `b`.
fn solve_linear(a: &mut [Vec<f64>], b: &mut [f64]) -> Result<Vec<f64>> {
    let n = b.len();
    let norm = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if !(a[pivot][col].abs() > SINGULAR_PIVOT * norm.max(1.0)) {
            return Err(CalibrationError::DegenerateCorrelation(
                "singular least-squares system".into(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }
    Ok(solution)
}

/// Map coefficients of q(t), t = (x - center) / scale, to coefficients of p(x).
fn unscale(scaled: &[f64], center: f64, scale: f64) -> Vec<f64> {
    let n = scaled.len();
    let mut coeffs = vec![0.0; n];
    for (j, &q) in scaled.iter().enumerate() {
        // ((x - c) / s)^j = s^-j * sum_i C(j, i) x^i (-c)^(j - i)
        let inv = scale.powi(-(j as i32));
        let mut binom = 1.0;
        for (i, coeff) in coeffs.iter_mut().enumerate().take(j + 1) {
            *coeff += q * inv * binom * (-center).powi((j - i) as i32);
            binom = binom * (j - i) as f64 / (i + 1) as f64;
        }
    }
    coeffs
}
