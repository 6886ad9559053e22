//! Ordinary least squares

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{check_training_set, check_width, FeatureRegressor};
use crate::domain::ModelKind;
use crate::error::{PipelineError, Result};

/// Singular values below this are treated as zero (minimum-norm solution)
const SVD_EPSILON: f64 = 1e-10;

/// Linear model `y = x·coefficients + intercept`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Least-squares fit through the SVD pseudo-inverse.
    ///
    /// With `fit_intercept` the columns and target are centred first, so the
    /// intercept itself is never shrunk by the minimum-norm choice.
    pub fn fit(x: &[Vec<f64>], y: &[f64], fit_intercept: bool) -> Result<Self> {
        let kind = ModelKind::LinearRegression;
        let n_features = check_training_set(kind, x, y)?;
        let n = x.len();

        let (x_means, y_mean) = if fit_intercept {
            let mut means = vec![0.0; n_features];
            for row in x {
                for (m, v) in means.iter_mut().zip(row) {
                    *m += v / n as f64;
                }
            }
            (means, y.iter().sum::<f64>() / n as f64)
        } else {
            (vec![0.0; n_features], 0.0)
        };

        let flat: Vec<f64> = x
            .iter()
            .flat_map(|row| row.iter().zip(&x_means).map(|(v, m)| v - m))
            .collect();
        let design = DMatrix::from_row_slice(n, n_features, &flat);
        let target = DVector::from_iterator(n, y.iter().map(|v| v - y_mean));

        let beta = design
            .svd(true, true)
            .solve(&target, SVD_EPSILON)
            .map_err(|e| PipelineError::fit(kind, e))?;

        let coefficients: Vec<f64> = beta.iter().copied().collect();
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();

        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::fit(kind, "solution is not finite"));
        }

        Ok(Self::new(coefficients, intercept))
    }
}

impl FeatureRegressor for LinearRegressionModel {
    fn kind(&self) -> ModelKind {
        ModelKind::LinearRegression
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        check_width(self.kind(), x, self.coefficients.len())?;
        Ok(x.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.coefficients)
                    .map(|(f, c)| f * c)
                    .sum::<f64>()
                    + self.intercept
            })
            .collect())
    }
}
