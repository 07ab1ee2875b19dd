use super::filter::{ResultFilter, SuccessStatus};
use super::payload::{PayloadBuilder, WarmUpPayload};
use crate::config::FunctionTarget;
use crate::transport::InvocationTransport;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Result of one warm-up call. Failed calls never raise; they are reported here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub target: String,
    pub region: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InvocationOutcome {
    pub fn succeeded(target: &FunctionTarget, data: Option<Value>) -> Self {
        Self {
            target: target.name.clone(),
            region: target.region.clone(),
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(target: &FunctionTarget, error: impl Into<String>) -> Self {
        Self {
            target: target.name.clone(),
            region: target.region.clone(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Invokes targets through an [`InvocationTransport`].
pub struct InvocationClient<P = WarmUpPayload, F = SuccessStatus> {
    transport: Arc<dyn InvocationTransport>,
    payload: P,
    filter: F,
}

impl InvocationClient {
    /// Warm-up payloads, any 2xx answer counts.
    pub fn new(transport: Arc<dyn InvocationTransport>) -> Self {
        Self::with_parts(transport, WarmUpPayload, SuccessStatus)
    }
}

impl<P: PayloadBuilder, F: ResultFilter> InvocationClient<P, F> {
    pub fn with_parts(transport: Arc<dyn InvocationTransport>, payload: P, filter: F) -> Self {
        Self {
            transport,
            payload,
            filter,
        }
    }

    pub async fn call(&self, target: &FunctionTarget) -> InvocationOutcome {
        let payload = match self.payload.build(target) {
            Ok(p) => p,
            Err(e) => return InvocationOutcome::failed(target, e.to_string()),
        };

        let response = match self
            .transport
            .invoke(&target.name, &target.region, &payload)
            .await
        {
            Ok(r) => r,
            Err(e) => return InvocationOutcome::failed(target, e.to_string()),
        };

        match self.filter.accept(&response) {
            Ok(()) => {
                debug!(function = target.name.as_str(), status = response.status, "warm-up call succeeded");
                InvocationOutcome::succeeded(target, response.data)
            }
            Err(reason) => InvocationOutcome::failed(target, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::EnvelopeStatus;
    use crate::transport::RecordingTransport;
    use serde_json::json;

    #[tokio::test]
    async fn successful_call_keeps_response_data() {
        let transport = Arc::new(RecordingTransport::new());
        let client = InvocationClient::new(transport.clone());
        let target = FunctionTarget::new("checkout", "eu-west-1");

        let outcome = client.call(&target).await;

        assert!(outcome.success);
        assert_eq!(outcome.region, "eu-west-1");
        assert_eq!(outcome.data, Some(json!({"status": 200, "msg": "warm"})));
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].payload["action"], json!("warm_up"));
    }

    #[tokio::test]
    async fn platform_failure_becomes_failed_outcome() {
        let transport = Arc::new(RecordingTransport::new().failing_for("checkout"));
        let client = InvocationClient::new(transport);

        let outcome = client.call(&FunctionTarget::new("checkout", "us-east-1")).await;

        assert!(!outcome.success);
        assert!(outcome.data.is_none());
        assert!(outcome.error.unwrap().starts_with("HTTP 500"));
    }

    #[tokio::test]
    async fn filter_decides_success() {
        let transport =
            Arc::new(RecordingTransport::new().with_body(json!({"status": 503, "msg": "cold"})));
        let client = InvocationClient::with_parts(transport, WarmUpPayload, EnvelopeStatus);

        let outcome = client.call(&FunctionTarget::new("checkout", "us-east-1")).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("function answered status 503: cold"));
    }
}
