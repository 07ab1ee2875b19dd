//! Fleet, target and scaling policy types.

use super::validator::ConfigValidator;
use crate::metrics::FunctionSettings;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A loosely typed configuration record (one `default` or `lambda_functions` entry).
pub type Record = Map<String, Value>;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_CONCURRENCY: u32 = 50;
pub const DEFAULT_MIN_CONTAINERS: u32 = 1;
pub const DEFAULT_MAX_CONTAINERS: u32 = 50;

/// Built-in values the `default` record is merged over.
pub fn builtin_default() -> Record {
    match json!({
        "region": DEFAULT_REGION,
        "scaling": {
            "max_concurrency": DEFAULT_MAX_CONCURRENCY,
            "min_containers": DEFAULT_MIN_CONTAINERS,
            "max_containers": DEFAULT_MAX_CONTAINERS,
        },
    }) {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Shallow merge: every top-level key of `overlay` replaces the one in `base`.
pub fn merge_records(base: &Record, overlay: &Record) -> Record {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    #[serde(default = "default_min_containers")]
    pub min_containers: u32,
    #[serde(default = "default_max_containers")]
    pub max_containers: u32,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_min_containers() -> u32 {
    DEFAULT_MIN_CONTAINERS
}

fn default_max_containers() -> u32 {
    DEFAULT_MAX_CONTAINERS
}

fn default_max_concurrency() -> u32 {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            min_containers: DEFAULT_MIN_CONTAINERS,
            max_containers: DEFAULT_MAX_CONTAINERS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ScalingPolicy {
    pub fn new(min_containers: u32, max_containers: u32, max_concurrency: u32) -> Self {
        Self {
            min_containers,
            max_containers,
            max_concurrency,
        }
    }

    /// Containers to warm for a forecast peak.
    ///
    /// The floor is `min_containers`; the ceiling is `max_containers` capped by the
    /// fleet-wide budget. The ceiling wins if the two ever cross.
    pub fn warm_count(&self, forecast_peak: u32, global_max_concurrency: u32) -> u32 {
        let upper = self.max_containers.min(global_max_concurrency);
        forecast_peak.max(self.min_containers).min(upper)
    }
}

/// One function to keep warm, built from the merged configuration records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTarget {
    pub name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Filled in once metrics collection has looked the function up.
    #[serde(default)]
    pub settings: Option<FunctionSettings>,
    #[serde(default)]
    pub scaling: ScalingPolicy,
    #[serde(default)]
    pub warm_payload: Option<Record>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl FunctionTarget {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
            settings: None,
            scaling: ScalingPolicy::default(),
            warm_payload: None,
        }
    }

    pub fn with_scaling(mut self, scaling: ScalingPolicy) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_settings(mut self, settings: FunctionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_warm_payload(mut self, payload: Record) -> Self {
        self.warm_payload = Some(payload);
        self
    }
}

/// Validated fleet configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetConfig {
    default: Record,
    functions: Vec<Record>,
    max_concurrency: u32,
}

impl FleetConfig {
    /// Validate a raw configuration document and fill in built-in defaults.
    pub fn from_value(options: Value) -> Result<Self> {
        ConfigValidator::new()?.validate(&options)?;

        let mut options = match options {
            Value::Object(map) => map,
            other => {
                return Err(Error::config_validation(format!(
                    "config must be a mapping, found {}",
                    type_name(&other)
                )))
            }
        };

        let default = match options.remove("default") {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => Record::new(),
            Some(other) => {
                return Err(Error::config_validation(format!(
                    "config 'default' is of type {}, expected a mapping",
                    type_name(&other)
                ))
                .with_context(ErrorContext::new().with_field_path("default")))
            }
        };
        let default = merge_records(&builtin_default(), &default);

        let functions = match options.remove("lambda_functions") {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(map) => Ok(map),
                    other => Err(Error::config_validation(format!(
                        "function entries must be mappings, found {}",
                        type_name(&other)
                    ))
                    .with_context(
                        ErrorContext::new().with_field_path(format!("lambda_functions[{}]", i)),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            _ => {
                return Err(Error::config_validation("config option 'lambda_functions' is missing")
                    .with_context(ErrorContext::new().with_field_path("lambda_functions")))
            }
        };

        let max_concurrency = default
            .get("scaling")
            .and_then(|s| s.get("max_concurrency"))
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .ok_or_else(|| {
                Error::config_validation("'scaling.max_concurrency' must be a positive integer")
                    .with_context(
                        ErrorContext::new().with_field_path("default.scaling.max_concurrency"),
                    )
            })?;

        let config = Self {
            default,
            functions,
            max_concurrency,
        };
        // Surface per-function problems at load time rather than mid-run.
        config.targets()?;
        Ok(config)
    }

    /// The `default` record after merging over the built-in defaults.
    pub fn default_record(&self) -> &Record {
        &self.default
    }

    pub fn functions(&self) -> &[Record] {
        &self.functions
    }

    /// Fleet-wide concurrency budget.
    pub fn max_concurrency(&self) -> u32 {
        self.max_concurrency
    }

    /// Expand every function record into a [`FunctionTarget`].
    pub fn targets(&self) -> Result<Vec<FunctionTarget>> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let field = format!("lambda_functions[{}]", i);
                let merged = merge_records(&self.default, record);
                let target: FunctionTarget = serde_json::from_value(Value::Object(merged))
                    .map_err(|e| {
                        Error::config_validation(format!("invalid function entry: {}", e))
                            .with_context(ErrorContext::new().with_field_path(field.clone()))
                    })?;

                if target.scaling.min_containers > target.scaling.max_containers {
                    return Err(Error::config_validation(format!(
                        "min_containers ({}) exceeds max_containers ({})",
                        target.scaling.min_containers, target.scaling.max_containers
                    ))
                    .with_context(
                        ErrorContext::new()
                            .with_field_path(format!("{}.scaling", field))
                            .with_target(target.name.clone()),
                    ));
                }
                Ok(target)
            })
            .collect()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
