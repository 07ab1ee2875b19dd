use crate::transport::InvocationResponse;
use serde_json::Value;

/// Decides whether a platform response counts as a successful call.
///
/// `Err` carries the reason reported in the failed outcome.
pub trait ResultFilter: Send + Sync {
    fn accept(&self, response: &InvocationResponse) -> Result<(), String>;
}

/// Accepts any 2xx response without a function error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuccessStatus;

impl ResultFilter for SuccessStatus {
    fn accept(&self, response: &InvocationResponse) -> Result<(), String> {
        if response.is_success() {
            return Ok(());
        }
        Err(describe_failure(response))
    }
}

/// Additionally requires the function's own response envelope to report `status: 200`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeStatus;

impl ResultFilter for EnvelopeStatus {
    fn accept(&self, response: &InvocationResponse) -> Result<(), String> {
        SuccessStatus.accept(response)?;
        let data = response.data.as_ref().unwrap_or(&Value::Null);
        match data.get("status").and_then(Value::as_u64) {
            Some(200) => Ok(()),
            Some(status) => Err(format!(
                "function answered status {}: {}",
                status,
                data.get("msg").and_then(Value::as_str).unwrap_or("no message")
            )),
            None => Err("function response carries no status".to_string()),
        }
    }
}

fn describe_failure(response: &InvocationResponse) -> String {
    match &response.error {
        Some(Value::String(s)) => format!("HTTP {}: {}", response.status, s),
        Some(error) => format!("HTTP {}: {}", response.status, error),
        None => format!("HTTP {}", response.status),
    }
}
