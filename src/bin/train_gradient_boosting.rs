//! Train and score the gradient-boosted tree model.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let report = run_step(PipelineStep::TrainGradientBoosting, steps::train_gradient_boosting)?;
    println!(
        "{}: {} (predictions: {})",
        report.model.label(),
        report.metrics,
        report.predictions_path.display()
    );
    Ok(())
}
