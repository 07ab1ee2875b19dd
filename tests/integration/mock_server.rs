//! Mock metadata service and invocation endpoint for integration tests

use fleet_warmer::metrics::HttpMetadataProvider;
use fleet_warmer::transport::HttpTransport;
use fleet_warmer::{Orchestrator, RunContext};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};
use std::sync::Arc;

/// One mockito server playing both the metadata service and the platform.
pub struct MockFleet {
    pub server: ServerGuard,
}

impl MockFleet {
    pub async fn new() -> Self {
        Self {
            server: mockito::Server::new_async().await,
        }
    }

    pub fn transport(&self) -> HttpTransport {
        HttpTransport::new()
            .expect("transport")
            .with_endpoint(self.server.url())
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let transport = self.transport();
        let metadata = Arc::new(
            HttpMetadataProvider::new(&self.server.url(), transport.clone()).expect("metadata"),
        );
        Orchestrator::new(RunContext::default(), metadata.clone(), metadata, Arc::new(transport))
    }

    /// Serve a flat concurrency history and the given settings for one function.
    pub async fn function(&mut self, name: &str, concurrency: f64, settings: Value) {
        let samples: Vec<Value> = (0..12)
            .map(|i| json!({"timestamp": 1_700_000_000 + i * 300, "value": concurrency}))
            .collect();

        self.server
            .mock("GET", format!("/functions/{name}/concurrency").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "samples": samples }).to_string())
            .create_async()
            .await;

        self.server
            .mock("GET", format!("/functions/{name}/settings").as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(settings.to_string())
            .create_async()
            .await;
    }

    /// Expect exactly `calls` warm-up invocations of `name`, answered with `status`.
    pub async fn invocations(&mut self, name: &str, status: usize, calls: usize) -> Mock {
        let body = if (200..300).contains(&status) {
            json!({"status": 200, "msg": "warm"})
        } else {
            json!({"errorMessage": "function unavailable"})
        };

        self.server
            .mock(
                "POST",
                format!("/2015-03-31/functions/{name}/invocations").as_str(),
            )
            .match_header("x-warmer-request-id", Matcher::Regex("^[0-9a-f-]{36}$".into()))
            .match_body(Matcher::PartialJson(json!({"action": "warm_up"})))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(calls)
            .create_async()
            .await
    }
}

pub fn settings(runtime: &str, memory_size: u32) -> Value {
    json!({
        "Runtime": runtime,
        "MemorySize": memory_size,
        "Timeout": 30,
    })
}
