//! Fit the seasonal model on the full history and forecast the horizon.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let report = run_step(PipelineStep::TrainSeasonal, steps::train_seasonal)?;
    println!(
        "{}: {} (predictions: {})",
        report.model.label(),
        report.metrics,
        report.predictions_path.display()
    );
    Ok(())
}
