//! Generate the synthetic hourly consumption series.

use energy_forecast::pipeline::{run_step, steps, PipelineStep};

fn main() -> anyhow::Result<()> {
    let path = run_step(PipelineStep::PrepareInput, steps::prepare_input)?;
    println!("Raw series written to {}", path.display());
    Ok(())
}
