use chrono::{NaiveDate, NaiveDateTime};
use figment::{providers::{Env, Format, Yaml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::domain::{timestamp, ModelKind};
use crate::error::{PipelineError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config/global_config.yaml";
/// Environment variable overriding [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "ENERGY_FORECAST_CONFIG";

pub const PROCESSED_SERIES_FILE: &str = "processed_data.csv";
pub const FEATURE_TABLE_FILE: &str = "processed_data_features.csv";
pub const EVALUATION_SUMMARY_FILE: &str = "model_evaluation_summary.csv";
pub const COMPARISON_PLOT_FILE: &str = "model_comparison.svg";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    pub data_paths: DataPaths,
    pub model_paths: ModelPaths,
    #[validate(nested)]
    pub modeling: ModelingConfig,
    #[serde(alias = "prophet")]
    #[validate(nested)]
    pub seasonal: SeasonalConfig,
    #[serde(alias = "xgboost")]
    #[validate(nested)]
    pub gradient_boosting: GradientBoostingConfig,
    pub linear_regression: LinearRegressionConfig,
    #[serde(default)]
    #[validate(nested)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub processed: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelPaths {
    pub predictions: PathBuf,
    pub plots: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ModelingConfig {
    #[validate(range(min = 1, max = 8784))]
    pub horizon_hours: u32,
    /// Fraction of the feature table held out (chronologically last rows)
    #[serde(default = "default_test_size")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_size: f64,
    /// Seed for synthesis when `synthesis.seed` is not set
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeasonalConfig {
    pub daily_seasonality: bool,
    /// `None` enables yearly seasonality once the history spans two years
    #[serde(default)]
    pub yearly_seasonality: Option<bool>,
    /// `None` enables weekly seasonality once the history spans two weeks
    #[serde(default)]
    pub weekly_seasonality: Option<bool>,
    #[validate(range(exclusive_min = 0.0))]
    pub changepoint_prior_scale: f64,
    #[serde(default = "default_seasonality_prior_scale")]
    #[validate(range(exclusive_min = 0.0))]
    pub seasonality_prior_scale: f64,
    #[serde(default = "default_interval_width")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub interval_width: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradientBoostingConfig {
    #[validate(range(min = 1, max = 10000))]
    pub n_estimators: usize,
    #[validate(range(min = 1, max = 32))]
    pub max_depth: u16,
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub learning_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinearRegressionConfig {
    pub fit_intercept: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SynthesisConfig {
    #[serde(with = "timestamp")]
    pub start: NaiveDateTime,
    /// Inclusive
    #[serde(with = "timestamp")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub seed: Option<u64>,
    #[validate(range(min = 0.0))]
    pub noise_std: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        let year = |m, d, h| {
            NaiveDate::from_ymd_opt(2024, m, d)
                .and_then(|date| date.and_hms_opt(h, 0, 0))
                .unwrap_or_default()
        };
        Self {
            start: year(1, 1, 0),
            end: year(12, 31, 23),
            seed: None,
            noise_std: 0.2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            request_timeout_secs: 120,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl DashboardConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_seasonality_prior_scale() -> f64 {
    10.0
}

fn default_interval_width() -> f64 {
    0.8
}

impl Config {
    /// Load from `$ENERGY_FORECAST_CONFIG` or `config/global_config.yaml`,
    /// with `EF__SECTION__KEY` environment overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipelineError::ConfigMissing(path.to_path_buf()));
        }

        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("EF__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn processed_series_path(&self) -> PathBuf {
        self.data_paths.processed.join(PROCESSED_SERIES_FILE)
    }

    pub fn feature_table_path(&self) -> PathBuf {
        self.data_paths.processed.join(FEATURE_TABLE_FILE)
    }

    pub fn predictions_path(&self, model: ModelKind) -> PathBuf {
        self.model_paths.predictions.join(model.predictions_file())
    }

    pub fn plot_path(&self, model: ModelKind) -> PathBuf {
        self.model_paths.plots.join(model.plot_file())
    }

    pub fn evaluation_summary_path(&self) -> PathBuf {
        self.model_paths.predictions.join(EVALUATION_SUMMARY_FILE)
    }

    pub fn comparison_plot_path(&self) -> PathBuf {
        self.model_paths.plots.join(COMPARISON_PLOT_FILE)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE_YAML: &str = r#"
data_paths:
  processed: data/processed
model_paths:
  predictions: results/predictions
  plots: results/plots
modeling:
  horizon_hours: 48
prophet:
  daily_seasonality: true
  yearly_seasonality: false
  changepoint_prior_scale: 0.05
xgboost:
  n_estimators: 50
  max_depth: 4
  learning_rate: 0.1
linear_regression:
  fit_intercept: true
"#;

    /// [`SAMPLE_YAML`] parsed without touching the filesystem
    pub(crate) fn sample_config() -> Config {
        Figment::from(Yaml::string(SAMPLE_YAML)).extract().unwrap()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_with_legacy_block_names() {
        let file = write_config(SAMPLE_YAML);
        let cfg = Config::from_file(file.path()).unwrap();

        assert_eq!(cfg.modeling.horizon_hours, 48);
        assert_eq!(cfg.modeling.test_size, 0.2);
        assert!(cfg.seasonal.daily_seasonality);
        assert_eq!(cfg.seasonal.interval_width, 0.8);
        assert_eq!(cfg.gradient_boosting.n_estimators, 50);
        assert!(cfg.linear_regression.fit_intercept);
        assert_eq!(cfg.logging.dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_artifact_paths() {
        let file = write_config(SAMPLE_YAML);
        let cfg = Config::from_file(file.path()).unwrap();

        assert_eq!(
            cfg.feature_table_path(),
            PathBuf::from("data/processed/processed_data_features.csv")
        );
        assert_eq!(
            cfg.predictions_path(ModelKind::Seasonal),
            PathBuf::from("results/predictions/predictions_seasonal.csv")
        );
        assert_eq!(
            cfg.comparison_plot_path(),
            PathBuf::from("results/plots/model_comparison.svg")
        );
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigMissing(_)));
    }

    #[test]
    fn test_rejects_out_of_range_learning_rate() {
        let yaml = SAMPLE_YAML.replace("learning_rate: 0.1", "learning_rate: 0.0");
        let file = write_config(&yaml);
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_missing_section_is_config_error() {
        let yaml = SAMPLE_YAML.replace("linear_regression:\n  fit_intercept: true\n", "");
        let file = write_config(&yaml);
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_default_synthesis_covers_2024() {
        let synthesis = SynthesisConfig::default();
        assert_eq!(timestamp::format(&synthesis.start), "2024-01-01 00:00:00");
        assert_eq!(timestamp::format(&synthesis.end), "2024-12-31 23:00:00");
        assert_eq!(synthesis.seed, None);
    }

    #[test]
    fn test_seed_and_seasonality_defaults() {
        let cfg = sample_config();
        assert_eq!(cfg.modeling.random_seed, 42);
        assert_eq!(cfg.synthesis.seed, None);
        assert_eq!(cfg.seasonal.yearly_seasonality, Some(false));
        assert_eq!(cfg.seasonal.weekly_seasonality, None);
    }
}
