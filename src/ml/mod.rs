//! Forecasting Models
//!
//! Three models are fitted by the pipeline:
//! - Gradient boosting over shallow regression trees (feature table)
//! - Ordinary least squares (feature table)
//! - Additive trend + Fourier seasonality model (raw series)
//!
//! The two feature-table regressors share [`FeatureRegressor`]; the seasonal
//! model works on timestamps directly and produces interval forecasts.

use smartcore::linalg::basic::matrix::DenseMatrix;

use crate::domain::ModelKind;
use crate::error::{PipelineError, Result};

pub mod gradient_boosting;
pub mod linear;
pub mod seasonal;
pub mod training;

pub use gradient_boosting::GradientBoostingModel;
pub use linear::LinearRegressionModel;
pub use seasonal::SeasonalModel;
pub use training::{chronological_split, train_feature_model, train_seasonal_model, TrainingReport};

/// A model fitted on feature vectors ordered as
/// [`FEATURE_COLUMNS`](crate::domain::FEATURE_COLUMNS).
pub trait FeatureRegressor: Send + Sync {
    fn kind(&self) -> ModelKind;

    /// Predict one value per row
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>>;
}

/// Check a training set and return its feature count.
pub(crate) fn check_training_set(model: ModelKind, x: &[Vec<f64>], y: &[f64]) -> Result<usize> {
    if x.is_empty() || y.is_empty() {
        return Err(PipelineError::fit(model, "cannot train on empty dataset"));
    }
    if x.len() != y.len() {
        return Err(PipelineError::fit(
            model,
            format!("feature and target count mismatch: {} rows, {} targets", x.len(), y.len()),
        ));
    }
    let n_features = x[0].len();
    check_width(model, x, n_features)?;
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(PipelineError::fit(model, "training data contains non-finite values"));
    }
    Ok(n_features)
}

pub(crate) fn check_width(model: ModelKind, x: &[Vec<f64>], n_features: usize) -> Result<()> {
    match x.iter().position(|row| row.len() != n_features) {
        Some(i) => Err(PipelineError::fit(
            model,
            format!("row {i} has {} features, expected {n_features}", x[i].len()),
        )),
        None => Ok(()),
    }
}

/// Row-major feature rows as a smartcore matrix
pub(crate) fn to_dense(x: &[Vec<f64>], n_features: usize) -> DenseMatrix<f64> {
    let flat: Vec<f64> = x.iter().flat_map(|row| row.iter().copied()).collect();
    DenseMatrix::new(x.len(), n_features, flat, false)
}
