use energy_forecast::domain::ModelKind;
use energy_forecast::pipeline::steps;
use energy_forecast::repo::{read_predictions, read_summary};

use super::common::Workspace;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[test]
fn missing_prediction_file_is_skipped() {
    let ws = Workspace::ten_days();
    ws.train_all();
    std::fs::remove_file(ws.cfg.predictions_path(ModelKind::LinearRegression)).unwrap();

    let summary = steps::evaluate_models(&ws.cfg).unwrap();
    assert_eq!(summary.evaluated(), 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].model, ModelKind::LinearRegression);

    let persisted = read_summary(&ws.cfg.evaluation_summary_path()).unwrap();
    assert_eq!(persisted.len(), 2);
    assert!(persisted.iter().all(|r| r.model != "LinearRegression"));
}

#[test]
fn no_predictions_still_writes_summary() {
    let ws = Workspace::ten_days();

    let summary = steps::evaluate_models(&ws.cfg).unwrap();
    assert_eq!(summary.evaluated(), 0);
    assert_eq!(summary.skipped.len(), 3);
    assert!(read_summary(&ws.cfg.evaluation_summary_path()).unwrap().is_empty());
    assert!(ws.cfg.comparison_plot_path().is_file());
}

#[test]
fn evaluation_is_idempotent_and_matches_stored_predictions() {
    let ws = Workspace::ten_days();
    ws.train_all();

    let first = steps::evaluate_models(&ws.cfg).unwrap();
    let second = steps::evaluate_models(&ws.cfg).unwrap();
    assert_eq!(first.rows, second.rows);

    let stored = read_predictions(&ws.cfg.predictions_path(ModelKind::GradientBoosting)).unwrap();
    let errors: Vec<f64> = stored
        .complete_rows()
        .filter_map(|r| Some(r.actual? - r.predicted?))
        .collect();
    let n = errors.len() as f64;
    let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

    let row = first
        .rows
        .iter()
        .find(|r| r.model == "GradientBoosting")
        .unwrap();
    assert!((row.rmse - round3(rmse)).abs() < 1e-9);
    assert!((row.mae - round3(mae)).abs() < 1e-9);
}
