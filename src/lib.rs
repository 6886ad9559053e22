//! Hourly energy-consumption forecasting: a batch pipeline that synthesizes
//! data, engineers features, trains three models and evaluates them, plus a
//! dashboard serving the results and forecasting uploaded data.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod ml;
pub mod pipeline;
pub mod plots;
pub mod repo;
pub mod simulation;
pub mod telemetry;
