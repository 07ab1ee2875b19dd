use super::{MetricSample, MetricsProvider, MetricsQuery, RawSettings, SettingsProvider};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Serves fixed samples and settings per function name.
///
/// Unknown functions fail the same way an unreachable provider would.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataProvider {
    functions: HashMap<String, (Vec<MetricSample>, RawSettings)>,
    failing_metrics: HashSet<String>,
    failing_settings: HashSet<String>,
}

impl InMemoryMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        samples: Vec<MetricSample>,
        settings: RawSettings,
    ) -> Self {
        self.functions.insert(name.into(), (samples, settings));
        self
    }

    pub fn fail_metrics_for(mut self, name: impl Into<String>) -> Self {
        self.failing_metrics.insert(name.into());
        self
    }

    pub fn fail_settings_for(mut self, name: impl Into<String>) -> Self {
        self.failing_settings.insert(name.into());
        self
    }

    fn lookup(&self, name: &str) -> Option<&(Vec<MetricSample>, RawSettings)> {
        self.functions.get(name)
    }
}

#[async_trait]
impl MetricsProvider for InMemoryMetadataProvider {
    async fn concurrency_samples(
        &self,
        function_name: &str,
        _region: &str,
        query: &MetricsQuery,
    ) -> Result<Vec<MetricSample>> {
        match self.lookup(function_name) {
            Some((samples, _)) if !self.failing_metrics.contains(function_name) => Ok(samples
                .iter()
                .take(query.max_points as usize)
                .copied()
                .collect()),
            _ => Err(Error::get_metrics("metrics unavailable").with_context(
                ErrorContext::new()
                    .with_target(function_name)
                    .with_source("in_memory_metadata"),
            )),
        }
    }
}

#[async_trait]
impl SettingsProvider for InMemoryMetadataProvider {
    async fn settings(&self, function_name: &str, _region: &str) -> Result<RawSettings> {
        match self.lookup(function_name) {
            Some((_, settings)) if !self.failing_settings.contains(function_name) => {
                Ok(settings.clone())
            }
            _ => Err(Error::get_settings("settings unavailable").with_context(
                ErrorContext::new()
                    .with_target(function_name)
                    .with_source("in_memory_metadata"),
            )),
        }
    }
}
