//! # Synthetic Consumption Series
//!
//! Generates an hourly energy-consumption series with a daily sinusoid, a
//! yearly cosine modulation and Gaussian noise. Output is deterministic for a
//! given seed; `synthesis.seed` falls back to `modeling.random_seed`.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::config::SynthesisConfig;
use crate::domain::{EnergyReading, TimeSeries};

/// Synthesizer parameters (mirrors the `synthesis` config block)
#[derive(Debug, Clone)]
pub struct ConsumptionSynthesizer {
    start: NaiveDateTime,
    end: NaiveDateTime,
    seed: u64,
    noise_std: f64,
}

impl ConsumptionSynthesizer {
    pub fn new(config: &SynthesisConfig, default_seed: u64) -> Self {
        Self {
            start: config.start,
            end: config.end,
            seed: config.seed.unwrap_or(default_seed),
            noise_std: config.noise_std,
        }
    }

    /// Hourly timestamps from `start` to `end`, both inclusive
    pub fn date_range(&self) -> Vec<NaiveDateTime> {
        if self.end < self.start {
            return Vec::new();
        }
        let hours = (self.end - self.start).num_hours();
        (0..=hours)
            .map(|h| self.start + Duration::hours(h))
            .collect()
    }

    /// Noise-free consumption for a timestamp
    pub fn expected_kwh(timestamp: NaiveDateTime) -> f64 {
        let base_demand = 3.0 + 2.0 * (2.0 * PI * timestamp.hour() as f64 / 24.0).sin();
        let seasonal_effect = 1.0 + 0.5 * (2.0 * PI * timestamp.ordinal() as f64 / 365.0).cos();
        base_demand * seasonal_effect
    }

    pub fn generate(&self) -> TimeSeries {
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed);
        // noise_std is validated non-negative; NaN is the only failure left
        let noise = Normal::new(0.0, self.noise_std).ok();

        let readings = self
            .date_range()
            .into_iter()
            .map(|ts| {
                let n = noise.as_ref().map_or(0.0, |dist| dist.sample(&mut rng));
                let value = round2(Self::expected_kwh(ts) + n);
                EnergyReading::new(ts, value)
            })
            .collect();

        // Timestamps are generated strictly increasing and values are finite
        TimeSeries::new(readings).unwrap_or_default()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
