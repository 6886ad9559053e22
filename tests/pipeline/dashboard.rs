use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use energy_forecast::api::{router, AppState};

use super::common::Workspace;

const BOUNDARY: &str = "energyforecastboundary";

fn app(ws: &Workspace) -> Router {
    router(AppState::new(ws.cfg.clone()))
}

fn upload(uri: &str, csv: &str, horizon_hours: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"upload.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"horizon_hours\"\r\n\r\n\
         {horizon_hours}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn hourly_csv(hours: usize) -> String {
    let mut csv = String::from("timestamp,energy_kwh\n");
    for h in 0..hours {
        let value = 4.0 + 2.0 * (2.0 * std::f64::consts::PI * (h % 24) as f64 / 24.0).sin();
        csv.push_str(&format!("2025-02-{:02} {:02}:00:00,{value:.2}\n", 1 + h / 24, h % 24));
    }
    csv
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_reports_degraded_without_artifacts() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["predictions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn index_warns_about_missing_artifacts() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(Request::get("/?model=linear_regression").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("No prediction file found for Linear Regression."));
    assert!(html.contains("Evaluation summary not found"));
    assert!(html.contains("name=\"horizon_hours\""));
}

#[tokio::test]
async fn index_shows_trained_models() {
    let ws = Workspace::ten_days();
    ws.train_all();
    energy_forecast::pipeline::steps::evaluate_models(&ws.cfg).unwrap();

    let response = app(&ws)
        .oneshot(Request::get("/?model=gradient_boosting").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<option value=\"gradient_boosting\" selected>"));
    assert!(html.contains("<svg"));
    assert!(html.contains("<td>GradientBoosting</td>"));
    assert!(!html.contains("class=\"warning\""));
}

#[tokio::test]
async fn upload_with_invalid_horizon_is_rejected() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(upload("/forecast", &hourly_csv(48), "10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_text(response).await;
    assert!(html.contains("multiple of 6"));
}

#[tokio::test]
async fn upload_missing_energy_column_is_rejected() {
    let ws = Workspace::ten_days();
    let csv = "timestamp,kwh\n2025-02-01 00:00:00,1.0\n2025-02-01 01:00:00,2.0\n";
    let response = app(&ws)
        .oneshot(upload("/forecast", csv, "24"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("energy_kwh"));
}

#[tokio::test]
async fn upload_renders_forecast_page() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(upload("/forecast", &hourly_csv(72), "24"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<td>2025-02-01 00:00:00</td>"));
    assert!(html.contains("download=\"uploaded_forecast_results.csv\""));
    assert!(html.contains("data:text/csv;charset=utf-8,timestamp%2Cpredicted_energy_kwh"));
    assert!(html.contains("<th>RMSE</th>"));
}

#[tokio::test]
async fn upload_with_blank_and_unsorted_rows_is_cleaned() {
    let ws = Workspace::ten_days();
    let mut rows: Vec<String> = hourly_csv(72).lines().skip(1).map(str::to_owned).collect();
    rows.swap(0, 10);
    rows.push("2025-02-04 00:00:00,".to_string());
    rows.push("2025-02-04 01:00:00,NaN".to_string());
    let csv = format!("timestamp,energy_kwh\n{}\n", rows.join("\n"));

    let response = app(&ws)
        .oneshot(upload("/forecast", &csv, "24"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("72 rows uploaded"));
    assert!(html.contains("Skipped 2 rows with a blank or NaN energy_kwh value."));
    assert!(html.contains("Rows were sorted by timestamp before forecasting."));
    assert!(html.contains("<td>2025-02-01 00:00:00</td>"));
}

#[tokio::test]
async fn api_forecast_returns_csv_attachment() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(upload("/api/v1/forecast", &hourly_csv(48), "6"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"uploaded_forecast_results.csv\""
    );
    let csv = body_text(response).await;
    assert_eq!(csv.lines().count(), 1 + 48 + 6);
}

#[tokio::test]
async fn api_predictions_of_unknown_model_is_not_found() {
    let ws = Workspace::ten_days();
    let response = app(&ws)
        .oneshot(Request::get("/api/v1/predictions/prophet").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(&ws)
        .oneshot(Request::get("/api/v1/evaluation").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
