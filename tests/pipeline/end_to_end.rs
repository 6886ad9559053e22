use energy_forecast::domain::ModelKind;
use energy_forecast::pipeline::steps;
use energy_forecast::repo::{read_feature_table, read_predictions, read_series, read_summary};
use strum::IntoEnumIterator;

use super::common::Workspace;

#[test]
fn thirty_hours_leave_six_feature_rows() {
    let ws = Workspace::new("2024-01-01 00:00:00", "2024-01-02 05:00:00");

    let raw = steps::prepare_input(&ws.cfg).unwrap();
    assert_eq!(read_series(&raw).unwrap().len(), 30);

    assert_eq!(steps::feature_engineering(&ws.cfg).unwrap(), 6);
    let table = read_feature_table(&ws.cfg.feature_table_path()).unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(
        energy_forecast::domain::timestamp::format(&table[0].timestamp),
        "2024-01-02 00:00:00"
    );
}

#[test]
fn short_history_still_trains_every_model() {
    let ws = Workspace::new("2024-01-01 00:00:00", "2024-01-02 05:00:00");
    ws.train_all();

    for kind in ModelKind::iter() {
        let stored = read_predictions(&ws.cfg.predictions_path(kind)).unwrap();
        assert!(!stored.rows.is_empty(), "{kind} wrote no predictions");
        assert_eq!(stored.actual().len(), stored.predicted().len());
        assert!(stored.predicted().iter().all(Option::is_some));
        assert!(stored.complete_rows().count() > 0);
        assert!(ws.cfg.plot_path(kind).is_file());
    }
}

#[test]
fn full_pipeline_produces_all_artifacts() {
    let ws = Workspace::ten_days();
    steps::prepare_input(&ws.cfg).unwrap();
    let table_rows = steps::feature_engineering(&ws.cfg).unwrap();
    assert_eq!(table_rows, 240 - 24);

    let gbr = steps::train_gradient_boosting(&ws.cfg).unwrap();
    assert_eq!(gbr.test_rows, 44);
    assert_eq!(gbr.train_rows, table_rows - 44);
    assert!(gbr.metrics.rmse.is_finite());

    let linear = steps::train_linear(&ws.cfg).unwrap();
    // Lag and rolling features explain most of the synthetic signal
    assert!(linear.metrics.rmse < 1.0, "linear rmse {}", linear.metrics.rmse);

    let seasonal = steps::train_seasonal(&ws.cfg).unwrap();
    assert_eq!(seasonal.train_rows, table_rows);
    assert_eq!(seasonal.test_rows, table_rows);
    let stored = read_predictions(&ws.cfg.predictions_path(ModelKind::Seasonal)).unwrap();
    assert_eq!(stored.rows.len(), table_rows + 48);
    assert!(stored.rows[table_rows..].iter().all(|r| r.actual.is_none()));

    let summary = steps::evaluate_models(&ws.cfg).unwrap();
    assert_eq!(summary.evaluated(), 3);
    assert!(summary.skipped.is_empty());

    let persisted = read_summary(&ws.cfg.evaluation_summary_path()).unwrap();
    let names: Vec<&str> = persisted.iter().map(|r| r.model.as_str()).collect();
    assert_eq!(names, vec!["Seasonal", "GradientBoosting", "LinearRegression"]);
    assert!(ws.cfg.comparison_plot_path().is_file());
}

#[test]
fn trainers_fail_without_feature_table() {
    let ws = Workspace::ten_days();
    steps::prepare_input(&ws.cfg).unwrap();

    assert!(steps::train_linear(&ws.cfg).is_err());
    assert!(steps::train_seasonal(&ws.cfg).is_err());
    assert!(!ws.cfg.predictions_path(ModelKind::LinearRegression).exists());
}
