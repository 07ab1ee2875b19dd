//! Request boundary: validates an incoming event, runs the pipeline and wraps the
//! result (or any failure, including a panic) in an [`Envelope`].

use crate::config::{provider_for_source, ConfigProvider};
use crate::pipeline::Orchestrator;
use crate::response::Envelope;
use crate::{Error, ErrorContext, Result};
use futures::FutureExt;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Arguments every event must carry.
pub const REQUIRED_ARGS: &[&str] = &["action"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Full run: collect, forecast, plan and dispatch.
    WarmUp,
    /// Dry run that returns the batch plan.
    Plan,
}

impl Action {
    pub const ALL: [Action; 2] = [Action::WarmUp, Action::Plan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::WarmUp => "warm_up",
            Action::Plan => "plan",
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
                Error::invalid_request(format!(
                    "unknown action '{}', expected one of: {}",
                    s,
                    known.join(", ")
                ))
                .with_context(ErrorContext::new().with_field_path("action"))
            })
    }
}

/// A validated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupRequest {
    pub action: Action,
    /// Path or http(s) URL overriding the handler's configuration source.
    pub config: Option<String>,
}

pub struct WarmupHandler {
    orchestrator: Orchestrator,
    config: Option<Arc<dyn ConfigProvider>>,
}

impl WarmupHandler {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            config: None,
        }
    }

    /// Configuration source used when the event does not name one.
    pub fn with_config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config = Some(provider);
        self
    }

    pub fn validate_request(event: &Value) -> Result<WarmupRequest> {
        let args = event.as_object().ok_or_else(|| {
            Error::invalid_request("request must be a JSON object")
                .with_context(ErrorContext::new().with_source("warmup_handler"))
        })?;

        let missing: Vec<&str> = REQUIRED_ARGS
            .iter()
            .copied()
            .filter(|k| args.get(*k).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(Error::invalid_request(format!(
                "missing required arguments: {}",
                missing.join(", ")
            ))
            .with_context(ErrorContext::new().with_field_path(missing.join(","))));
        }

        let action = args
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::invalid_request("'action' must be a string")
                    .with_context(ErrorContext::new().with_field_path("action"))
            })?
            .parse::<Action>()?;

        let config = match args.get("config") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                return Err(Error::invalid_request("'config' must be a string")
                    .with_context(ErrorContext::new().with_field_path("config")))
            }
        };

        Ok(WarmupRequest { action, config })
    }

    /// Never fails: errors and panics become a 500 envelope.
    pub async fn handle(&self, event: Value) -> Envelope {
        let outcome = AssertUnwindSafe(self.process(&event)).catch_unwind().await;
        match outcome {
            Ok(Ok(data)) => Envelope::success(data, event),
            Ok(Err(err)) => {
                error!(kind = err.kind().as_str(), error = %err, "warm-up request failed");
                Envelope::failure(&err, event)
            }
            Err(panic) => {
                let description = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(error = description.as_str(), "warm-up request panicked");
                Envelope::internal("InternalError", description, event)
            }
        }
    }

    async fn process(&self, event: &Value) -> Result<Value> {
        let request = Self::validate_request(event)?;
        let provider = match &request.config {
            Some(source) => provider_for_source(source)?,
            None => self.config.clone().ok_or_else(|| {
                Error::invalid_request("no configuration source given")
                    .with_context(ErrorContext::new().with_field_path("config"))
            })?,
        };

        info!(
            action = request.action.as_str(),
            origin = provider.origin().as_str(),
            "handling warm-up request"
        );
        let config = provider.load().await?;

        match request.action {
            Action::WarmUp => {
                let report = self.orchestrator.run(&config).await?;
                Ok(json!({
                    "warm_results": report.warm_results,
                    "batches": report.batches,
                    "failed_calls": report.failed_calls,
                    "run_id": report.run_id,
                }))
            }
            Action::Plan => Ok(serde_json::to_value(self.orchestrator.plan_only(&config).await?)?),
        }
    }
}
