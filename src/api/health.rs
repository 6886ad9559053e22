use std::path::Path;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use strum::IntoEnumIterator;

use super::AppState;
use crate::config::Config;
use crate::domain::ModelKind;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    predictions: Vec<ComponentHealth>,
    evaluation_summary: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    name: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ComponentHealth {
    fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "healthy".to_string(),
            error: None,
        }
    }

    fn missing(name: impl Into<String>, path: &Path) -> Self {
        Self {
            name: name.into(),
            status: "missing".to_string(),
            error: Some(format!("{} not found", path.display())),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

fn artifact_health(name: impl Into<String>, path: &Path) -> ComponentHealth {
    if path.is_file() {
        ComponentHealth::healthy(name)
    } else {
        ComponentHealth::missing(name, path)
    }
}

fn collect_checks(cfg: &Config) -> HealthChecks {
    HealthChecks {
        predictions: ModelKind::iter()
            .map(|kind| artifact_health(kind.slug(), &cfg.predictions_path(kind)))
            .collect(),
        evaluation_summary: artifact_health("evaluation_summary", &cfg.evaluation_summary_path()),
    }
}

/// GET /health - Health check endpoint
///
/// Always 200: the dashboard keeps serving with missing artifacts, which
/// only degrade the reported status.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks = collect_checks(&state.cfg);
    let all_healthy =
        checks.predictions.iter().all(ComponentHealth::is_healthy) && checks.evaluation_summary.is_healthy();

    let response = HealthResponse {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        timestamp: chrono::Utc::now(),
        checks,
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/live - Liveness check
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}
