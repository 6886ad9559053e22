//! Train and score the linear regression model.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let report = run_step(PipelineStep::TrainLinear, steps::train_linear)?;
    println!(
        "{}: {} (predictions: {})",
        report.model.label(),
        report.metrics,
        report.predictions_path.display()
    );
    Ok(())
}
