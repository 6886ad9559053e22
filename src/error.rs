use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by pipeline steps.
///
/// Binaries wrap these in `anyhow` with step context; the evaluator turns them
/// into warnings instead of propagating.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration file not found: {0}")]
    ConfigMissing(PathBuf),

    #[error("failed to load configuration: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    #[error("input file not found: {0}")]
    InputMissing(PathBuf),

    #[error("malformed input in {path}: {reason}")]
    MalformedInput { path: PathBuf, reason: String },

    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("{model} fit failed: {reason}")]
    FitFailure { model: String, reason: String },

    #[error("artifact not found: {0}")]
    ArtifactMissing(PathBuf),

    #[error("plot rendering failed: {0}")]
    Plot(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn fit(model: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::FitFailure {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn plot(err: impl std::fmt::Display) -> Self {
        Self::Plot(err.to_string())
    }
}

impl From<figment::Error> for PipelineError {
    fn from(error: figment::Error) -> Self {
        PipelineError::Config(Box::new(error))
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
