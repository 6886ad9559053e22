//! Batch pipeline: the individual steps, the evaluator and the process runner.

pub mod evaluation;
pub mod runner;
pub mod steps;

pub use evaluation::{evaluate, EvaluationSummary, SkippedModel};
pub use runner::{PipelineReport, PipelineRunner, PipelineStep, StepCommand, StepOutcome, StepStatus};
pub use steps::run_step;
