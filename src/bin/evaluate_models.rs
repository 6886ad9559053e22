//! Compare the persisted predictions of every model.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let summary = run_step(PipelineStep::EvaluateModels, steps::evaluate_models)?;
    for row in &summary.rows {
        println!("{:<20} RMSE={:.3} MAE={:.3}", row.model, row.rmse, row.mae);
    }
    for skipped in &summary.skipped {
        println!("{:<20} skipped: {}", skipped.model.to_string(), skipped.reason);
    }
    Ok(())
}
