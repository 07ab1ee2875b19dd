//! 调用传输层：向无服务器平台发送函数调用请求。
//!
//! # Invocation Transport
//!
//! The transport is the only component that talks to the serverless platform's
//! invocation API. Everything above it works against the [`InvocationTransport`]
//! trait so tests and alternative platforms can plug in their own implementation.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`HttpTransport`] | reqwest-based client for the platform invocation API |
//! | [`RecordingTransport`] | In-memory transport that records calls, for tests |

pub mod http;
mod memory;

pub use http::HttpTransport;
pub use memory::{RecordedCall, RecordingTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw result of one invocation as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status: u16,
    pub data: Option<Value>,
    pub error: Option<Value>,
}

impl InvocationResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(status: u16, error: Value) -> Self {
        Self {
            status,
            data: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.error.is_none()
    }
}

/// Invokes a single function with a JSON payload.
///
/// Timeouts are the implementation's responsibility; callers never wrap `invoke` in one.
#[async_trait]
pub trait InvocationTransport: Send + Sync {
    async fn invoke(
        &self,
        function_name: &str,
        region: &str,
        payload: &Value,
    ) -> Result<InvocationResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Other(String),
}
