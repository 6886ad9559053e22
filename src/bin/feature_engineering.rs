//! Build the feature table from the raw series.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let rows = run_step(PipelineStep::FeatureEngineering, steps::feature_engineering)?;
    println!("Feature table written ({rows} rows)");
    Ok(())
}
