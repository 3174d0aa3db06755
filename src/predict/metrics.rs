//! Holdout metrics.

/// Coefficient of determination.
///
/// A constant target has no variance to explain: a perfect fit scores 1.0 and
/// anything else 0.0.
pub fn r2(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    let sse: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    (sse / n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(r2(&y, &y), 1.0);
        assert_eq!(rmse(&y, &y), 0.0);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        let y = [1.0, 2.0, 3.0];
        let p = [2.0, 2.0, 2.0];
        assert!(r2(&y, &p).abs() < 1e-12);
        assert!((rmse(&y, &p) - (2.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_target() {
        assert_eq!(r2(&[4.0, 4.0], &[4.0, 4.0]), 1.0);
        assert_eq!(r2(&[4.0, 4.0], &[4.0, 5.0]), 0.0);
    }

    #[test]
    fn worse_than_mean_is_negative() {
        assert!(r2(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
    }
}
