//! Sequential process runner
//!
//! Each step is a sibling binary launched as a child process. The runner
//! waits for each one and stops at the first non-zero exit.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{error, info};

/// The pipeline steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    PrepareInput,
    FeatureEngineering,
    TrainSeasonal,
    TrainGradientBoosting,
    TrainLinear,
    EvaluateModels,
}

impl PipelineStep {
    /// Binary and log file name of the step
    pub fn name(&self) -> String {
        self.to_string()
    }
}

/// Log name of the runner itself
pub const RUNNER_LOG: &str = "main_pipeline";

/// A command to run for one step
#[derive(Debug, Clone)]
pub struct StepCommand {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl StepCommand {
    pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepStatus {
    Succeeded,
    /// `code` is `None` when the process could not be started or was killed
    Failed { code: Option<i32>, stderr: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub step: String,
    #[serde(flatten)]
    pub status: StepStatus,
    pub elapsed: Duration,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Succeeded
    }
}

/// Outcomes of the steps that were attempted, in order
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<StepOutcome>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(StepOutcome::succeeded)
    }

    pub fn failed_step(&self) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| !o.succeeded())
    }
}

pub struct PipelineRunner {
    steps: Vec<StepCommand>,
}

impl PipelineRunner {
    pub fn new(steps: Vec<StepCommand>) -> Self {
        Self { steps }
    }

    /// The standard step sequence, resolved against the binaries in `dir`
    pub fn with_binaries_in(dir: &Path) -> Self {
        let steps = PipelineStep::iter()
            .map(|step| {
                let program = dir.join(format!("{}{}", step.name(), std::env::consts::EXE_SUFFIX));
                StepCommand::new(step.name(), program)
            })
            .collect();
        Self::new(steps)
    }

    /// The standard step sequence next to the running executable
    pub fn from_current_exe() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::with_binaries_in(dir))
    }

    pub fn steps(&self) -> &[StepCommand] {
        &self.steps
    }

    /// Run the steps in order, stopping after the first failure.
    pub fn run(&self) -> PipelineReport {
        let mut report = PipelineReport::default();
        info!(steps = self.steps.len(), "starting pipeline");

        for step in &self.steps {
            info!(step = %step.name, "running step");
            let outcome = run_one(step);

            match &outcome.status {
                StepStatus::Succeeded => {
                    info!(step = %step.name, elapsed_ms = outcome.elapsed.as_millis() as u64, "step completed");
                }
                StepStatus::Failed { code, stderr } => {
                    error!(step = %step.name, ?code, stderr = %stderr.trim_end(), "step failed, halting pipeline");
                }
            }

            let failed = !outcome.succeeded();
            report.outcomes.push(outcome);
            if failed {
                return report;
            }
        }

        info!("pipeline completed");
        report
    }
}

fn run_one(step: &StepCommand) -> StepOutcome {
    let started = Instant::now();
    let status = match Command::new(&step.program).args(&step.args).output() {
        Ok(output) if output.status.success() => StepStatus::Succeeded,
        Ok(output) => StepStatus::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(e) => StepStatus::Failed {
            code: None,
            stderr: format!("failed to start {}: {e}", step.program.display()),
        },
    };

    StepOutcome {
        step: step.name.clone(),
        status,
        elapsed: started.elapsed(),
    }
}
