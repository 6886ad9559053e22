//! # Data Synthesis
//!
//! Synthetic input for the forecasting pipeline.

pub mod consumption;

pub use consumption::ConsumptionSynthesizer;
