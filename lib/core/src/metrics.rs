//! Regression fit metrics for the loaded model against recorded outcomes

use crate::{Error, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FitMetrics {
    pub samples: usize,
    pub mse: f64,
    pub rmse: f64,
    pub max_error: f64,
    /// Mean absolute percentage error, as a fraction. Zero targets are
    /// guarded with `f64::EPSILON` in the denominator.
    pub mape: f64,
    pub r2: f64,
    pub mae: f64,
}

impl FitMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(Error::InvalidDimension {
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(Error::Validation("no samples to evaluate".to_string()));
        }

        let n = y_true.len() as f64;
        let mut squared = 0.0;
        let mut absolute = 0.0;
        let mut percentage = 0.0;
        let mut max_error: f64 = 0.0;
        for (t, p) in y_true.iter().zip(y_pred) {
            let err = t - p;
            squared += err * err;
            absolute += err.abs();
            percentage += err.abs() / t.abs().max(f64::EPSILON);
            max_error = max_error.max(err.abs());
        }

        let mean = y_true.iter().sum::<f64>() / n;
        let total: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
        // Constant targets: perfect fit scores 1, anything else 0
        let r2 = if total == 0.0 {
            if squared == 0.0 { 1.0 } else { 0.0 }
        } else {
            1.0 - squared / total
        };

        let mse = squared / n;
        Ok(Self {
            samples: y_true.len(),
            mse,
            rmse: mse.sqrt(),
            max_error,
            mape: percentage / n,
            r2,
            mae: absolute / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_fit() {
        let m = FitMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.max_error, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_known_values() {
        let m = FitMetrics::compute(&[2.0, 4.0], &[3.0, 2.0]).unwrap();
        assert!((m.mse - 2.5).abs() < 1e-12);
        assert!((m.rmse - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(m.max_error, 2.0);
        assert!((m.mae - 1.5).abs() < 1e-12);
        assert!((m.mape - 0.5).abs() < 1e-12);
        // mean 3, total = 2, residual = 5
        assert!((m.r2 - (1.0 - 5.0 / 2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(FitMetrics::compute(&[1.0], &[]).is_err());
        assert!(FitMetrics::compute(&[], &[]).is_err());
    }
}
