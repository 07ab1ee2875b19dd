use super::{MetricSample, MetricsProvider, MetricsQuery, RawSettings, SettingsProvider};
use crate::transport::{HttpTransport, TransportError};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// Metrics and settings lookups against a JSON metadata service.
///
/// - `GET {base}/functions/{name}/concurrency?region=..&start=..&end=..&period=..&max_points=..`
///   answers `{"samples": [{"timestamp": 1700000000, "value": 3}, ...]}`
/// - `GET {base}/functions/{name}/settings?region=..` answers
///   `{"runtime": "python3.12", "memory_size": 512, "timeout": 30, "network_isolation": false}`
#[derive(Clone)]
pub struct HttpMetadataProvider {
    transport: HttpTransport,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct SamplesBody {
    samples: Vec<MetricSample>,
}

impl HttpMetadataProvider {
    pub fn new(base_url: &str, transport: HttpTransport) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(TransportError::from)?;
        Ok(Self {
            transport,
            base_url,
        })
    }

    /// Uses `WARMER_METADATA_URL` as the service base URL.
    pub fn from_env(transport: HttpTransport) -> Result<Self> {
        let base = std::env::var("WARMER_METADATA_URL").map_err(|_| {
            TransportError::Other("WARMER_METADATA_URL is not set".to_string())
        })?;
        Self::new(&base, transport)
    }

    fn function_url(&self, function_name: &str, resource: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                TransportError::Other(format!("'{}' cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["functions", function_name, resource]);
        Ok(url)
    }
}

#[async_trait]
impl MetricsProvider for HttpMetadataProvider {
    async fn concurrency_samples(
        &self,
        function_name: &str,
        region: &str,
        query: &MetricsQuery,
    ) -> Result<Vec<MetricSample>> {
        let context = || {
            ErrorContext::new()
                .with_target(function_name)
                .with_source("http_metadata")
        };

        let (start, end) = query.time_range();
        let mut url = self.function_url(function_name, "concurrency")?;
        url.query_pairs_mut()
            .append_pair("region", region)
            .append_pair("start", &start.to_string())
            .append_pair("end", &end.to_string())
            .append_pair("period", &query.period.as_secs().to_string())
            .append_pair("max_points", &query.max_points.to_string());

        let (status, body) = self.transport.get_json(url).await.map_err(|e| {
            Error::get_metrics("metrics request failed")
                .with_context(context())
                .with_cause(e)
        })?;
        if !(200..300).contains(&status) {
            return Err(Error::get_metrics(format!("metrics service answered HTTP {}", status))
                .with_context(context().with_status_code(status)));
        }

        let parsed: SamplesBody = serde_json::from_value(body).map_err(|e| {
            Error::get_metrics("malformed metrics response")
                .with_context(context().with_status_code(status))
                .with_cause(e)
        })?;
        Ok(parsed.samples)
    }
}

#[async_trait]
impl SettingsProvider for HttpMetadataProvider {
    async fn settings(&self, function_name: &str, region: &str) -> Result<RawSettings> {
        let context = || {
            ErrorContext::new()
                .with_target(function_name)
                .with_source("http_metadata")
        };

        let mut url = self.function_url(function_name, "settings")?;
        url.query_pairs_mut().append_pair("region", region);

        let (status, body) = self.transport.get_json(url).await.map_err(|e| {
            Error::get_settings("settings request failed")
                .with_context(context())
                .with_cause(e)
        })?;
        if !(200..300).contains(&status) {
            return Err(Error::get_settings(format!("settings service answered HTTP {}", status))
                .with_context(context().with_status_code(status)));
        }

        serde_json::from_value(body).map_err(|e| {
            Error::get_settings("malformed settings response")
                .with_context(context().with_status_code(status))
                .with_cause(e)
        })
    }
}
