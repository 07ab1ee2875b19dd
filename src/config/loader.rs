//! Fleet config providers for local files, remote URLs, and in-memory values

use super::FleetConfig;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Source of the fleet configuration.
///
/// Read and parse failures surface as `LoadConfigFailed`; a document that parses
/// but has the wrong shape surfaces as `ConfigValidationFailed`.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn load(&self) -> Result<FleetConfig>;

    /// Human readable origin, used in logs.
    fn origin(&self) -> String;
}

/// Pick a provider from a `config` string: http(s) URLs are fetched, anything else is a path.
pub fn provider_for_source(source: &str) -> Result<Arc<dyn ConfigProvider>> {
    let source = source.trim();
    if source.is_empty() {
        return Err(Error::invalid_request("config source must not be empty")
            .with_context(ErrorContext::new().with_field_path("config")));
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        Ok(Arc::new(UrlConfigProvider::new(source)?))
    } else {
        Ok(Arc::new(FileConfigProvider::new(source)))
    }
}

/// Parse YAML (or JSON, which YAML accepts) into a validated fleet config.
pub fn parse_config(content: &str, origin: &str) -> Result<FleetConfig> {
    let value: Value = serde_yaml::from_str(content).map_err(|e| {
        Error::load_config("could not parse the warm-up configuration")
            .with_context(
                ErrorContext::new()
                    .with_details(origin.to_string())
                    .with_source("config_loader"),
            )
            .with_cause(e)
    })?;
    FleetConfig::from_value(value)
}

/// Loads the fleet config from a local YAML/JSON file.
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load(&self) -> Result<FleetConfig> {
        let origin = self.origin();
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::load_config("could not read the warm-up configuration")
                .with_context(
                    ErrorContext::new()
                        .with_details(origin.clone())
                        .with_source("config_loader"),
                )
                .with_cause(e)
        })?;

        let content = decode_text(bytes, &origin)?;
        debug!(origin = origin.as_str(), "loaded fleet config");
        parse_config(&content, &origin)
    }

    fn origin(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Loads the fleet config from a remote URL.
pub struct UrlConfigProvider {
    url: String,
    client: reqwest::Client,
}

impl UrlConfigProvider {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                Error::load_config("failed to create HTTP client")
                    .with_context(ErrorContext::new().with_source("config_loader"))
                    .with_cause(e)
            })?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl ConfigProvider for UrlConfigProvider {
    async fn load(&self) -> Result<FleetConfig> {
        let context = || {
            ErrorContext::new()
                .with_details(self.url.clone())
                .with_source("config_loader")
        };

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            Error::load_config("HTTP request for the warm-up configuration failed")
                .with_context(context())
                .with_cause(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::load_config(format!(
                "configuration endpoint answered HTTP {}",
                status
            ))
            .with_context(context().with_status_code(status.as_u16())));
        }

        let content = response.text().await.map_err(|e| {
            Error::load_config("failed to read the configuration response")
                .with_context(context())
                .with_cause(e)
        })?;
        parse_config(&content, &self.url)
    }

    fn origin(&self) -> String {
        self.url.clone()
    }
}

/// Serves an already-parsed configuration document.
pub struct StaticConfigProvider {
    options: Value,
}

impl StaticConfigProvider {
    pub fn new(options: Value) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ConfigProvider for StaticConfigProvider {
    async fn load(&self) -> Result<FleetConfig> {
        FleetConfig::from_value(self.options.clone())
    }

    fn origin(&self) -> String {
        "static".to_string()
    }
}

/// Decode file bytes, honouring UTF-8 and UTF-16 LE byte order marks.
fn decode_text(bytes: Vec<u8>, origin: &str) -> Result<String> {
    let invalid = |reason: String| {
        Error::load_config(reason).with_context(
            ErrorContext::new()
                .with_details(origin.to_string())
                .with_source("config_loader"),
        )
    };

    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&utf16).map_err(|e| invalid(format!("invalid UTF-16: {}", e)))
    } else if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8(bytes[3..].to_vec())
            .map_err(|e| invalid(format!("invalid UTF-8 (after BOM): {}", e)))
    } else {
        String::from_utf8(bytes).map_err(|e| invalid(format!("invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn yaml_syntax_errors_are_load_failures() {
        let err = parse_config("lambda_functions: [\n  - name: a", "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadConfigFailed);
    }

    #[test]
    fn structural_errors_are_validation_failures() {
        let err = parse_config("lambda_functions: []\n", "inline").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigValidationFailed);
    }

    #[test]
    fn json_documents_are_accepted() {
        let config = parse_config(r#"{"lambda_functions": [{"name": "a"}]}"#, "inline").unwrap();
        assert_eq!(config.functions().len(), 1);
    }

    #[test]
    fn decodes_byte_order_marks() {
        let mut utf8 = vec![0xEF, 0xBB, 0xBF];
        utf8.extend_from_slice(b"a: 1");
        assert_eq!(decode_text(utf8, "t").unwrap(), "a: 1");

        let mut utf16 = vec![0xFF, 0xFE];
        for unit in "a: 1".encode_utf16() {
            utf16.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(utf16, "t").unwrap(), "a: 1");
    }

    #[tokio::test]
    async fn missing_file_is_a_load_failure() {
        let err = FileConfigProvider::new("/definitely/not/here/fleet.yaml")
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadConfigFailed);
    }

    #[test]
    fn source_selection() {
        assert_eq!(
            provider_for_source("https://config.example.com/fleet.yaml")
                .unwrap()
                .origin(),
            "https://config.example.com/fleet.yaml"
        );
        assert_eq!(provider_for_source("fleet.yaml").unwrap().origin(), "fleet.yaml");
        assert!(provider_for_source("  ").is_err());
    }
}
