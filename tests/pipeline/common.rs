//! Throwaway workspace with its own configuration file

use std::io::Write;

use energy_forecast::config::Config;
use energy_forecast::pipeline::steps;
use tempfile::TempDir;

pub struct Workspace {
    // Kept alive for the duration of the test
    _dir: TempDir,
    pub cfg: Config,
}

impl Workspace {
    /// Workspace whose synthetic series runs from `start` to `end` inclusive
    pub fn new(start: &str, end: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().display().to_string();
        let yaml = format!(
            r#"
data_paths:
  processed: {root}/data/processed
model_paths:
  predictions: {root}/results/predictions
  plots: {root}/results/plots
modeling:
  horizon_hours: 48
  test_size: 0.2
seasonal:
  daily_seasonality: true
  yearly_seasonality: false
  changepoint_prior_scale: 0.05
gradient_boosting:
  n_estimators: 40
  max_depth: 4
  learning_rate: 0.1
linear_regression:
  fit_intercept: true
synthesis:
  start: "{start}"
  end: "{end}"
  seed: 42
  noise_std: 0.2
logging:
  dir: {root}/logs
  level: info
"#
        );

        let path = dir.path().join("global_config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let cfg = Config::from_file(&path).unwrap();
        Self { _dir: dir, cfg }
    }

    /// Ten days of history
    pub fn ten_days() -> Self {
        Self::new("2024-03-01 00:00:00", "2024-03-10 23:00:00")
    }

    /// Every step up to and including the three trainers
    pub fn train_all(&self) {
        steps::prepare_input(&self.cfg).unwrap();
        steps::feature_engineering(&self.cfg).unwrap();
        steps::train_seasonal(&self.cfg).unwrap();
        steps::train_gradient_boosting(&self.cfg).unwrap();
        steps::train_linear(&self.cfg).unwrap();
    }
}
