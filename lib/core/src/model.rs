//! Model collaborators
//!
//! The trained model is consumed only through [`Predictor`] and
//! [`Explainer`]. Both operate on dense, schema-ordered feature vectors.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Opaque model inference. Must be deterministic for identical input.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Identifies the model the predictions come from
    fn model_version(&self) -> String {
        String::from("unversioned")
    }
}

/// Opaque, batched model explanation.
///
/// Returns one attribution row per input row, in the same order.
pub trait Explainer: Send + Sync {
    fn explain(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// Identifies the model the attributions come from
    fn model_version(&self) -> String {
        String::from("unversioned")
    }
}

/// Linear regression model with exact per-feature attributions.
///
/// `predict = intercept + Σ cᵢ·xᵢ` and the attribution of feature `i` is
/// `cᵢ·(xᵢ − baselineᵢ)`, the Shapley value of a linear model with
/// independent features. Attributions plus the baseline prediction add up
/// to the prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearModel {
    #[serde(default = "default_version")]
    pub version: String,
    /// Feature names in model order
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Expected feature values; zeros when omitted
    #[serde(default)]
    pub baseline: Vec<f64>,
}

fn default_version() -> String {
    String::from("1")
}

impl LinearModel {
    pub fn new(features: Vec<String>, intercept: f64, coefficients: Vec<f64>) -> Self {
        let baseline = vec![0.0; coefficients.len()];
        Self {
            version: default_version(),
            features,
            intercept,
            coefficients,
            baseline,
        }
    }

    #[must_use]
    pub fn with_baseline(mut self, baseline: Vec<f64>) -> Self {
        self.baseline = baseline;
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Check that names, coefficients and baseline line up
    pub fn validate(&mut self) -> Result<()> {
        if self.features.len() != self.coefficients.len() {
            return Err(Error::Configuration(format!(
                "model lists {} features but {} coefficients",
                self.features.len(),
                self.coefficients.len()
            )));
        }
        if self.baseline.is_empty() {
            self.baseline = vec![0.0; self.coefficients.len()];
        }
        if self.baseline.len() != self.coefficients.len() {
            return Err(Error::Configuration(format!(
                "model baseline has {} values, expected {}",
                self.baseline.len(),
                self.coefficients.len()
            )));
        }
        let finite = self.intercept.is_finite()
            && self.coefficients.iter().chain(&self.baseline).all(|v| v.is_finite());
        if !finite {
            return Err(Error::Configuration("model parameters must be finite".to_string()));
        }
        Ok(())
    }

    /// Prediction at the baseline point
    pub fn expected_value(&self) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(&self.baseline)
                .map(|(c, b)| c * b)
                .sum::<f64>()
    }

    fn check_dim(&self, row: &[f64]) -> Result<()> {
        if row.len() != self.coefficients.len() {
            return Err(Error::InvalidDimension {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }
}

impl Predictor for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        self.check_dim(features)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    fn model_version(&self) -> String {
        format!("linear/{}", self.version)
    }
}

impl Explainer for LinearModel {
    fn explain(&self, matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        matrix
            .iter()
            .map(|row| {
                self.check_dim(row)?;
                Ok(row
                    .iter()
                    .zip(&self.coefficients)
                    .zip(&self.baseline)
                    .map(|((x, c), b)| c * (x - b))
                    .collect())
            })
            .collect()
    }

    fn model_version(&self) -> String {
        format!("linear/{}", self.version)
    }
}
