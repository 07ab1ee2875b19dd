//! Per-run settings read once from the environment and passed down explicitly.

use crate::forecast::DEFAULT_SMOOTHING_LEVEL;
use crate::metrics::MetricsQuery;
use std::env;

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_FORECAST_HORIZON: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// Deployment stage, attached to log events.
    pub stage: String,
    /// Periods forecast ahead.
    pub forecast_horizon: usize,
    pub smoothing_level: f64,
    pub metrics_query: MetricsQuery,
}

impl Default for RunContext {
    fn default() -> Self {
        Self {
            stage: DEFAULT_STAGE.to_string(),
            forecast_horizon: DEFAULT_FORECAST_HORIZON,
            smoothing_level: DEFAULT_SMOOTHING_LEVEL,
            metrics_query: MetricsQuery::default(),
        }
    }
}

impl RunContext {
    /// `WARMER_STAGE`, `WARMER_FORECAST_HORIZON` and
    /// `WARMER_SMOOTHING_LEVEL`; unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stage: env::var("WARMER_STAGE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.stage),
            forecast_horizon: env::var("WARMER_FORECAST_HORIZON")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.forecast_horizon),
            smoothing_level: env::var("WARMER_SMOOTHING_LEVEL")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(defaults.smoothing_level),
            metrics_query: defaults.metrics_query,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }

    pub fn with_forecast_horizon(mut self, horizon: usize) -> Self {
        self.forecast_horizon = horizon;
        self
    }

    pub fn with_metrics_query(mut self, query: MetricsQuery) -> Self {
        self.metrics_query = query;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ctx = RunContext::default();
        assert_eq!(ctx.stage, "dev");
        assert_eq!(ctx.forecast_horizon, 3);
        assert_eq!(ctx.smoothing_level, 0.5);
    }

    #[test]
    fn builders_override() {
        let ctx = RunContext::default()
            .with_stage("prod")
            .with_forecast_horizon(6);
        assert_eq!(ctx.stage, "prod");
        assert_eq!(ctx.forecast_horizon, 6);
    }

    #[test]
    fn from_env_reads_run_settings() {
        std::env::set_var("WARMER_STAGE", "prod");
        std::env::set_var("WARMER_FORECAST_HORIZON", "5");
        std::env::set_var("WARMER_SMOOTHING_LEVEL", "not-a-number");
        let ctx = RunContext::from_env();
        std::env::remove_var("WARMER_STAGE");
        std::env::remove_var("WARMER_FORECAST_HORIZON");
        std::env::remove_var("WARMER_SMOOTHING_LEVEL");

        assert_eq!(ctx.stage, "prod");
        assert_eq!(ctx.forecast_horizon, 5);
        assert_eq!(ctx.smoothing_level, 0.5);
    }
}
