//! Run every pipeline step in order as a separate process.

use anyhow::{bail, Context};
use energy_forecast::config::Config;
use energy_forecast::pipeline::{runner::RUNNER_LOG, PipelineRunner, StepStatus};
use energy_forecast::telemetry::init_step_logging;

fn main() -> anyhow::Result<()> {
    let logging = Config::load().map(|c| c.logging).unwrap_or_default();
    let _guard = init_step_logging(&logging.dir, RUNNER_LOG, &logging.level)
        .context("initialising logging")?;

    let runner = PipelineRunner::from_current_exe().context("locating step binaries")?;
    let report = runner.run();

    for outcome in &report.outcomes {
        match &outcome.status {
            StepStatus::Succeeded => println!("completed: {}", outcome.step),
            StepStatus::Failed { stderr, .. } => {
                eprintln!("failed: {}\n{}", outcome.step, stderr.trim_end())
            }
        }
    }

    if let Some(failed) = report.failed_step() {
        bail!("pipeline stopped at {}", failed.step);
    }
    println!("All steps completed. Check {} for details.", logging.dir.display());
    Ok(())
}
