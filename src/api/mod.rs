pub mod dashboard;
pub mod error;
pub mod forecast;
pub mod health;
pub mod pages;
pub mod response;
pub mod v1;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;

/// Shared handler state. Artifacts are read per request, so only the
/// configuration is held.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        Self { cfg: Arc::new(cfg) }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.cfg.dashboard.max_upload_bytes;
    let timeout = Duration::from_secs(state.cfg.dashboard.request_timeout_secs);

    Router::new()
        .route("/", get(dashboard::index))
        .route("/forecast", post(dashboard::upload_forecast))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .nest("/api/v1", v1::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(body_limit))
                .layer(timeout_layer(timeout)),
        )
        .layer(TraceLayer::new_for_http())
}

/// Requests still running after `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
