use super::{InvocationResponse, InvocationTransport, TransportError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// One invocation seen by a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub function_name: String,
    pub region: String,
    pub payload: Value,
}

/// In-memory transport for tests: records every call and answers with a fixed body.
///
/// Functions registered with [`failing_for`](Self::failing_for) answer HTTP 500,
/// as does a single call picked with [`failing_call`](Self::failing_call).
#[derive(Clone)]
pub struct RecordingTransport {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    failing: HashSet<String>,
    failing_calls: HashSet<(String, usize)>,
    body: Value,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            failing: HashSet::new(),
            failing_calls: HashSet::new(),
            body: json!({"status": 200, "msg": "warm"}),
        }
    }

    pub fn failing_for(mut self, function_name: impl Into<String>) -> Self {
        self.failing.insert(function_name.into());
        self
    }

    /// Fails only the `nth` call (1-based) to `function_name`.
    pub fn failing_call(mut self, function_name: impl Into<String>, nth: usize) -> Self {
        self.failing_calls.insert((function_name.into(), nth));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_for(&self, function_name: &str) -> usize {
        self.calls
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.function_name == function_name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.calls.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvocationTransport for RecordingTransport {
    async fn invoke(
        &self,
        function_name: &str,
        region: &str,
        payload: &Value,
    ) -> Result<InvocationResponse, TransportError> {
        let nth = {
            let mut calls = self.calls.write().unwrap_or_else(|e| e.into_inner());
            calls.push(RecordedCall {
                function_name: function_name.to_string(),
                region: region.to_string(),
                payload: payload.clone(),
            });
            calls
                .iter()
                .filter(|c| c.function_name == function_name)
                .count()
        };

        if self.failing.contains(function_name)
            || self
                .failing_calls
                .contains(&(function_name.to_string(), nth))
        {
            return Ok(InvocationResponse::failed(
                500,
                json!({"errorMessage": format!("{} is unavailable", function_name)}),
            ));
        }
        Ok(InvocationResponse::ok(self.body.clone()))
    }
}
