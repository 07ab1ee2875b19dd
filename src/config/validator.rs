//! Fleet config validator using JSON Schema

use crate::{Error, ErrorContext, Result};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

/// Structural schema for a raw fleet configuration document.
///
/// Only shape is checked here; defaults and cross-field rules live in
/// [`FleetConfig::from_value`](super::FleetConfig::from_value).
const FLEET_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["lambda_functions"],
  "properties": {
    "default": {
      "type": ["object", "null"],
      "properties": {
        "region": { "type": "string", "minLength": 1 },
        "scaling": {
          "allOf": [
            { "$ref": "#/definitions/scaling" },
            { "required": ["max_concurrency"] }
          ]
        },
        "warm_payload": { "type": "object" }
      }
    },
    "lambda_functions": {
      "type": "array",
      "minItems": 1,
      "items": {
        "type": "object",
        "required": ["name"],
        "properties": {
          "name": { "type": "string", "minLength": 1 },
          "region": { "type": "string", "minLength": 1 },
          "scaling": { "$ref": "#/definitions/scaling" },
          "warm_payload": { "type": "object" }
        }
      }
    }
  },
  "definitions": {
    "scaling": {
      "type": "object",
      "properties": {
        "max_concurrency": { "type": "integer", "minimum": 1 },
        "min_containers": { "type": "integer", "minimum": 0 },
        "max_containers": { "type": "integer", "minimum": 0 }
      }
    }
  }
}"##;

pub struct ConfigValidator {
    schema: JSONSchema,
}

impl ConfigValidator {
    pub fn new() -> Result<Self> {
        let schema_value: Value = serde_json::from_str(FLEET_SCHEMA)?;
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_value)
            .map_err(|e| Error::config_validation(format!("failed to compile schema: {}", e)))?;
        Ok(Self { schema })
    }

    pub fn validate(&self, options: &Value) -> Result<()> {
        if let Err(errors) = self.schema.validate(options) {
            let mut paths = Vec::new();
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    let shown = if path.is_empty() { "/".to_string() } else { path };
                    paths.push(shown.clone());
                    format!("{}: {}", shown, e)
                })
                .collect();

            let mut context = ErrorContext::new().with_source("config_validator");
            if let Some(first) = paths.first() {
                context = context.with_field_path(first.clone());
            }
            return Err(Error::config_validation(format!(
                "JSON Schema validation failed:\n  - {}",
                messages.join("\n  - ")
            ))
            .with_context(context));
        }
        Ok(())
    }
}
