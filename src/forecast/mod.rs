//! 需求预测：基于简单指数平滑预测未来并发需求。
//!
//! # Demand Forecasting
//!
//! Simple exponential smoothing with a fixed smoothing level and no trend or
//! seasonal component:
//!
//! ```text
//! level[t] = alpha * y[t] + (1 - alpha) * level[t - 1]
//! ```
//!
//! The initial level is the only fitted parameter. Every one-step prediction is
//! affine in it, so the least-squares fit has a closed form and the model is
//! fitted in a single pass. All future periods share the final level, rounded
//! up to a whole container count.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SMOOTHING_LEVEL: f64 = 0.5;

/// Predictions within this distance of an integer are snapped before rounding up.
const INTEGER_TOLERANCE: f64 = 1e-9;

/// Predicted container demand, one value per future period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastResult {
    values: Vec<u32>,
}

impl ForecastResult {
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Highest demand over the horizon; zero for an empty forecast.
    pub fn peak(&self) -> u32 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<u32>> for ForecastResult {
    fn from(values: Vec<u32>) -> Self {
        Self { values }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DemandForecaster {
    smoothing_level: f64,
}

impl DemandForecaster {
    /// `smoothing_level` is clamped into `(0, 1]`.
    pub fn new(smoothing_level: f64) -> Self {
        let smoothing_level = if smoothing_level.is_finite() {
            smoothing_level.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_SMOOTHING_LEVEL
        };
        Self { smoothing_level }
    }

    pub fn smoothing_level(&self) -> f64 {
        self.smoothing_level
    }

    pub fn forecast(&self, history: &[f64], horizon: usize) -> Result<ForecastResult> {
        if history.is_empty() {
            return Err(Error::forecast("cannot forecast demand from an empty history")
                .with_context(ErrorContext::new().with_source("demand_forecaster")));
        }
        if let Some(pos) = history.iter().position(|v| !v.is_finite()) {
            return Err(Error::forecast("history contains a non-finite sample").with_context(
                ErrorContext::new()
                    .with_field_path(format!("history[{}]", pos))
                    .with_source("demand_forecaster"),
            ));
        }

        let count = to_container_count(self.final_level(history));
        Ok(ForecastResult::from(vec![count; horizon]))
    }

    fn final_level(&self, history: &[f64]) -> f64 {
        if history.len() < 2 {
            return history[history.len() - 1];
        }

        let alpha = self.smoothing_level;
        // Running level expressed as `offset + weight * initial_level`.
        let mut offset = 0.0;
        let mut weight = 1.0;
        let mut num = 0.0;
        let mut den = 0.0;

        for &y in history {
            num += weight * (y - offset);
            den += weight * weight;
            offset = alpha * y + (1.0 - alpha) * offset;
            weight *= 1.0 - alpha;
        }

        let initial_level = num / den;
        offset + weight * initial_level
    }
}

impl Default for DemandForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_LEVEL)
    }
}

fn to_container_count(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let nearest = value.round();
    let rounded = if (value - nearest).abs() < INTEGER_TOLERANCE {
        nearest
    } else {
        value.ceil()
    };
    rounded.min(u32::MAX as f64) as u32
}
