use crate::config::FunctionTarget;
use crate::Result;
use serde_json::Value;

/// Action name the warmed function recognises as a warm-up ping.
pub const WARM_UP_ACTION: &str = "warm_up";

/// Builds the JSON payload sent to one target.
pub trait PayloadBuilder: Send + Sync {
    fn build(&self, target: &FunctionTarget) -> Result<Value>;
}

/// `{"action": "warm_up", "settings": {...}}` on top of the target's configured
/// `warm_payload`. The two reserved keys always win.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarmUpPayload;

impl PayloadBuilder for WarmUpPayload {
    fn build(&self, target: &FunctionTarget) -> Result<Value> {
        let mut payload = target.warm_payload.clone().unwrap_or_default();
        payload.insert("action".into(), Value::String(WARM_UP_ACTION.into()));
        payload.insert("settings".into(), serde_json::to_value(&target.settings)?);
        Ok(Value::Object(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FunctionSettings;
    use crate::startup::RuntimeFamily;
    use serde_json::json;

    #[test]
    fn reserved_keys_override_configured_payload() {
        let target = FunctionTarget::new("checkout", "us-east-1")
            .with_warm_payload(
                json!({"action": "serve", "source": "warmer"})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .with_settings(FunctionSettings {
                runtime: RuntimeFamily::Python,
                memory_size: 512,
                timeout: 30,
                network_isolation: false,
                startup_time_ms: 12,
            });

        let payload = WarmUpPayload.build(&target).unwrap();
        assert_eq!(payload["action"], json!("warm_up"));
        assert_eq!(payload["source"], json!("warmer"));
        assert_eq!(payload["settings"]["runtime"], json!("python"));
        assert_eq!(payload["settings"]["startup_time_ms"], json!(12));
    }

    #[test]
    fn settings_are_null_before_collection() {
        let payload = WarmUpPayload
            .build(&FunctionTarget::new("checkout", "us-east-1"))
            .unwrap();
        assert_eq!(payload, json!({"action": "warm_up", "settings": null}));
    }
}
