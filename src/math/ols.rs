//! Ordinary least squares with an intercept.
//!
//! We solve
//!
//! ```text
//! minimize Σ (y_i - b - x_i^T β)^2
//! ```
//!
//! by centering `X` and `y`, solving the centered problem for β with SVD, and
//! recovering the intercept as `b = ȳ - x̄^T β`. SVD gives the minimum-norm β when
//! the design is rank deficient (e.g. collinear weather variables), so a fit
//! always exists once there is at least one observation.

use nalgebra::{DMatrix, DVector};

/// Fitted linear coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearFit {
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}

/// Solve a least squares problem using SVD.
///
/// Singular values below `max(σ) · max(n, p) · ε` are treated as zero.
/// Returns `None` if the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.ncols() == 0 {
        return Some(DVector::zeros(0));
    }
    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tol = max_sv * x.nrows().max(x.ncols()) as f64 * f64::EPSILON;

    let beta = svd.solve(y, tol).ok()?;
    beta.iter().all(|v| v.is_finite()).then_some(beta)
}

/// Fit `y ≈ b + X β`. Requires `x.nrows() == y.len() > 0`.
pub fn fit_with_intercept(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<LinearFit> {
    let n = x.nrows();
    if n == 0 || y.len() != n {
        return None;
    }
    let y_mean = y.mean();
    let x_means: Vec<f64> = (0..x.ncols()).map(|j| x.column(j).mean()).collect();

    let xc = DMatrix::from_fn(n, x.ncols(), |i, j| x[(i, j)] - x_means[j]);
    let yc = y.map(|v| v - y_mean);

    let beta = solve_least_squares(&xc, &yc)?;
    let intercept = y_mean - beta.iter().zip(x_means.iter()).map(|(b, m)| b * m).sum::<f64>();

    intercept.is_finite().then(|| LinearFit {
        intercept,
        coefficients: beta.iter().copied().collect(),
    })
}
