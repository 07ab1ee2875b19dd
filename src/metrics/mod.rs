//! 指标采集：获取函数的并发指标与当前配置。
//!
//! # Metrics Collection
//!
//! For every target the collector fetches the recent concurrency history and the
//! function's current settings from external providers, then formats the
//! settings (including an estimated cold-start time) for the warm-up payload.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`MetricsProvider`] | Concurrency time series for one function |
//! | [`SettingsProvider`] | Current runtime, memory and network settings for one function |
//! | [`MetricsCollector`] | Fetches both and produces a [`CollectedTarget`] |
//! | [`HttpMetadataProvider`] | HTTP/JSON implementation of both providers |
//! | [`InMemoryMetadataProvider`] | Fixed data for tests and dry runs |

mod http;
mod memory;

pub use http::HttpMetadataProvider;
pub use memory::InMemoryMetadataProvider;

use crate::config::FunctionTarget;
use crate::startup::{RuntimeFamily, StartupTimeEstimator};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const METRICS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
pub const METRICS_PERIOD: Duration = Duration::from_secs(300);
pub const METRICS_MAX_POINTS: u32 = 1000;

/// One observed concurrency reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub value: f64,
}

impl MetricSample {
    pub fn new(timestamp: u64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsQuery {
    /// How far back to look.
    pub window: Duration,
    /// Aggregation period of one sample (maximum per period).
    pub period: Duration,
    pub max_points: u32,
}

impl Default for MetricsQuery {
    fn default() -> Self {
        Self {
            window: METRICS_WINDOW,
            period: METRICS_PERIOD,
            max_points: METRICS_MAX_POINTS,
        }
    }
}

impl MetricsQuery {
    /// `(start, end)` in epoch seconds for a window ending now.
    pub fn time_range(&self) -> (u64, u64) {
        let end = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        (end.saturating_sub(self.window.as_secs()), end)
    }
}

/// Settings as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSettings {
    #[serde(alias = "Runtime")]
    pub runtime: String,
    #[serde(alias = "MemorySize")]
    pub memory_size: u32,
    #[serde(alias = "Timeout")]
    pub timeout: u32,
    #[serde(default)]
    pub network_isolation: bool,
}

/// Settings in the shape carried by warm-up payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSettings {
    pub runtime: RuntimeFamily,
    pub memory_size: u32,
    pub timeout: u32,
    pub network_isolation: bool,
    pub startup_time_ms: u64,
}

impl FunctionSettings {
    pub fn format(raw: &RawSettings, estimator: &StartupTimeEstimator) -> Self {
        let runtime = RuntimeFamily::normalize(&raw.runtime);
        Self {
            runtime,
            memory_size: raw.memory_size,
            timeout: raw.timeout,
            network_isolation: raw.network_isolation,
            startup_time_ms: estimator.estimate_family(
                runtime,
                raw.memory_size,
                raw.network_isolation,
            ),
        }
    }
}

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Fails with `GetMetricsFailed` when the provider does not answer successfully.
    async fn concurrency_samples(
        &self,
        function_name: &str,
        region: &str,
        query: &MetricsQuery,
    ) -> Result<Vec<MetricSample>>;
}

#[async_trait]
pub trait SettingsProvider: Send + Sync {
    /// Fails with `GetSettingsFailed` when the provider does not answer successfully.
    async fn settings(&self, function_name: &str, region: &str) -> Result<RawSettings>;
}

/// A target with its settings filled in and its concurrency history attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedTarget {
    pub target: FunctionTarget,
    pub samples: Vec<MetricSample>,
}

impl CollectedTarget {
    pub fn history(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }
}

pub struct MetricsCollector {
    metrics: Arc<dyn MetricsProvider>,
    settings: Arc<dyn SettingsProvider>,
    estimator: StartupTimeEstimator,
    query: MetricsQuery,
}

impl MetricsCollector {
    pub fn new(metrics: Arc<dyn MetricsProvider>, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            metrics,
            settings,
            estimator: StartupTimeEstimator::default(),
            query: MetricsQuery::default(),
        }
    }

    pub fn with_query(mut self, query: MetricsQuery) -> Self {
        self.query = query;
        self
    }

    pub fn with_estimator(mut self, estimator: StartupTimeEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn query(&self) -> &MetricsQuery {
        &self.query
    }

    pub async fn collect(&self, target: FunctionTarget) -> Result<CollectedTarget> {
        let (samples, raw) = futures::try_join!(
            self.metrics
                .concurrency_samples(&target.name, &target.region, &self.query),
            self.settings.settings(&target.name, &target.region),
        )?;

        let samples = normalize_samples(samples);
        let settings = FunctionSettings::format(&raw, &self.estimator);
        debug!(
            function = target.name.as_str(),
            region = target.region.as_str(),
            samples = samples.len(),
            runtime = %settings.runtime,
            startup_time_ms = settings.startup_time_ms,
            "collected metrics"
        );

        Ok(CollectedTarget {
            target: target.with_settings(settings),
            samples,
        })
    }

    /// Collect every target concurrently. The first failure aborts the whole collection.
    pub async fn collect_all(&self, targets: Vec<FunctionTarget>) -> Result<Vec<CollectedTarget>> {
        futures::future::try_join_all(targets.into_iter().map(|t| self.collect(t))).await
    }
}

/// Sort ascending by timestamp; for a repeated timestamp the last reading wins.
fn normalize_samples(mut samples: Vec<MetricSample>) -> Vec<MetricSample> {
    samples.sort_by_key(|s| s.timestamp);
    let mut out: Vec<MetricSample> = Vec::with_capacity(samples.len());
    for sample in samples {
        match out.last_mut() {
            Some(last) if last.timestamp == sample.timestamp => *last = sample,
            _ => out.push(sample),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn raw(runtime: &str, memory: u32, isolated: bool) -> RawSettings {
        RawSettings {
            runtime: runtime.to_string(),
            memory_size: memory,
            timeout: 30,
            network_isolation: isolated,
        }
    }

    #[test]
    fn samples_are_sorted_and_deduplicated() {
        let samples = normalize_samples(vec![
            MetricSample::new(600, 3.0),
            MetricSample::new(0, 1.0),
            MetricSample::new(300, 2.0),
            MetricSample::new(300, 5.0),
        ]);
        let values: Vec<_> = samples.iter().map(|s| (s.timestamp, s.value)).collect();
        assert_eq!(values, vec![(0, 1.0), (300, 5.0), (600, 3.0)]);
    }

    #[test]
    fn settings_are_formatted_with_startup_estimate() {
        let settings = FunctionSettings::format(&raw("python3.12", 512, false), &StartupTimeEstimator::new());
        assert_eq!(settings.runtime, RuntimeFamily::Python);
        assert_eq!(settings.startup_time_ms, 12);

        let isolated = FunctionSettings::format(&raw("python3.12", 512, true), &StartupTimeEstimator::new());
        assert_eq!(isolated.startup_time_ms, 12 + crate::startup::ISOLATED_NETWORK_OVERHEAD_MS);
    }

    #[test]
    fn raw_settings_accept_platform_field_names() {
        let parsed: RawSettings = serde_json::from_value(serde_json::json!({
            "Runtime": "nodejs20.x",
            "MemorySize": 256,
            "Timeout": 15,
        }))
        .unwrap();
        assert_eq!(parsed, RawSettings {
            runtime: "nodejs20.x".into(),
            memory_size: 256,
            timeout: 15,
            network_isolation: false,
        });
    }

    #[tokio::test]
    async fn collect_fills_settings_and_orders_samples() {
        let provider = Arc::new(
            InMemoryMetadataProvider::new().with_function(
                "checkout",
                vec![MetricSample::new(10, 4.0), MetricSample::new(5, 2.0)],
                raw("java17", 1024, false),
            ),
        );
        let collector = MetricsCollector::new(provider.clone(), provider);

        let collected = collector
            .collect(FunctionTarget::new("checkout", "us-east-1"))
            .await
            .unwrap();

        assert_eq!(collected.history(), vec![2.0, 4.0]);
        let settings = collected.target.settings.unwrap();
        assert_eq!(settings.runtime, RuntimeFamily::Java);
        assert_eq!(settings.startup_time_ms, 712);
    }

    #[tokio::test]
    async fn one_failure_fails_the_collection() {
        let provider = Arc::new(
            InMemoryMetadataProvider::new()
                .with_function("a", vec![MetricSample::new(0, 1.0)], raw("python", 128, false))
                .with_function("b", vec![MetricSample::new(0, 1.0)], raw("python", 128, false))
                .fail_settings_for("b"),
        );
        let collector = MetricsCollector::new(provider.clone(), provider);

        let err = collector
            .collect_all(vec![
                FunctionTarget::new("a", "us-east-1"),
                FunctionTarget::new("b", "us-east-1"),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GetSettingsFailed);
    }

    #[tokio::test]
    async fn unknown_function_is_a_metrics_failure() {
        let provider = Arc::new(InMemoryMetadataProvider::new());
        let collector = MetricsCollector::new(provider.clone(), provider);

        let err = collector
            .collect(FunctionTarget::new("ghost", "us-east-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GetMetricsFailed);
    }
}
