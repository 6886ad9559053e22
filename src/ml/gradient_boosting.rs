//! Gradient-boosted regression trees
//!
//! Squared-error boosting on top of SmartCore's `DecisionTreeRegressor`:
//! start from the mean target, then each stage fits a shallow tree to the
//! current residuals and adds a shrunken copy of its prediction.

use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use tracing::debug;

use super::{check_training_set, check_width, to_dense, FeatureRegressor};
use crate::config::GradientBoostingConfig;
use crate::domain::ModelKind;
use crate::error::{PipelineError, Result};

type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Residuals below this are treated as a perfect fit and end boosting early
const RESIDUAL_EPSILON: f64 = 1e-12;

pub struct GradientBoostingModel {
    initial_prediction: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
    n_features: usize,
}

impl GradientBoostingModel {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &GradientBoostingConfig) -> Result<Self> {
        let kind = ModelKind::GradientBoosting;
        let n_features = check_training_set(kind, x, y)?;
        let matrix = to_dense(x, n_features);

        let initial_prediction = y.iter().sum::<f64>() / y.len() as f64;
        let mut fitted = vec![initial_prediction; y.len()];
        let tree_params = DecisionTreeRegressorParameters::default()
            .with_max_depth(params.max_depth)
            .with_min_samples_leaf(1)
            .with_min_samples_split(2);

        let mut trees = Vec::with_capacity(params.n_estimators);
        for stage in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(t, f)| t - f).collect();
            if residuals.iter().all(|r| r.abs() < RESIDUAL_EPSILON) {
                debug!(stage, "residuals vanished, stopping early");
                break;
            }

            let tree = Tree::fit(&matrix, &residuals, tree_params.clone())
                .map_err(|e| PipelineError::fit(kind, format!("stage {stage}: {e}")))?;
            let update = tree
                .predict(&matrix)
                .map_err(|e| PipelineError::fit(kind, format!("stage {stage}: {e}")))?;

            for (f, u) in fitted.iter_mut().zip(update) {
                *f += params.learning_rate * u;
            }
            trees.push(tree);
        }

        debug!(stages = trees.len(), n_features, "gradient boosting fitted");
        Ok(Self {
            initial_prediction,
            learning_rate: params.learning_rate,
            trees,
            n_features,
        })
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }
}

impl FeatureRegressor for GradientBoostingModel {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosting
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        if x.is_empty() {
            return Ok(Vec::new());
        }
        check_width(self.kind(), x, self.n_features)?;

        let matrix = to_dense(x, self.n_features);
        let mut out = vec![self.initial_prediction; x.len()];
        for tree in &self.trees {
            let update = tree
                .predict(&matrix)
                .map_err(|e| PipelineError::fit(self.kind(), e))?;
            for (o, u) in out.iter_mut().zip(update) {
                *o += self.learning_rate * u;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_estimators: usize, max_depth: u16, learning_rate: f64) -> GradientBoostingConfig {
        GradientBoostingConfig {
            n_estimators,
            max_depth,
            learning_rate,
        }
    }

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| if r[0] < 10.0 { 1.0 } else { 6.0 }).collect();
        (x, y)
    }

    fn sse(model: &GradientBoostingModel, x: &[Vec<f64>], y: &[f64]) -> f64 {
        model
            .predict(x)
            .unwrap()
            .iter()
            .zip(y)
            .map(|(p, t)| (p - t).powi(2))
            .sum()
    }

    #[test]
    fn test_learns_step_function() {
        let (x, y) = step_data();
        let model = GradientBoostingModel::fit(&x, &y, &params(60, 2, 0.1)).unwrap();

        let preds = model.predict(&[vec![2.0, 0.0], vec![15.0, 1.0]]).unwrap();
        assert!((preds[0] - 1.0).abs() < 0.1, "low side: {}", preds[0]);
        assert!((preds[1] - 6.0).abs() < 0.1, "high side: {}", preds[1]);
    }

    #[test]
    fn test_more_stages_reduce_training_error() {
        let (x, y) = step_data();
        let few = GradientBoostingModel::fit(&x, &y, &params(2, 2, 0.1)).unwrap();
        let many = GradientBoostingModel::fit(&x, &y, &params(30, 2, 0.1)).unwrap();

        assert!(sse(&many, &x, &y) < sse(&few, &x, &y));
    }

    #[test]
    fn test_constant_target_stops_early() {
        let x: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let y = vec![3.0; 5];
        let model = GradientBoostingModel::fit(&x, &y, &params(10, 3, 0.3)).unwrap();

        assert_eq!(model.n_stages(), 0);
        assert_eq!(model.predict(&[vec![100.0]]).unwrap(), vec![3.0]);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (x, y) = step_data();
        let model = GradientBoostingModel::fit(&x, &y, &params(3, 2, 0.1)).unwrap();

        let err = model.predict(&[vec![1.0]]).unwrap_err();
        assert!(matches!(err, PipelineError::FitFailure { .. }));
        assert!(model.predict(&[]).unwrap().is_empty());
    }
}
