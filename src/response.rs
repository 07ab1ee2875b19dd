//! Response envelope returned at the request boundary.

use crate::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    /// The error followed by each of its causes, outermost first.
    pub trace: Vec<String>,
}

impl ErrorDetails {
    pub fn from_error(error: &Error) -> Self {
        let mut trace = vec![error.to_string()];
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }
        Self {
            kind: error.kind().as_str().to_string(),
            description: error.to_string(),
            trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub status: u16,
    pub msg: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorDetails>,
    pub original_request: Value,
}

impl Envelope {
    pub fn success(data: Value, original_request: Value) -> Self {
        Self {
            status: 200,
            msg: "success".to_string(),
            data: Some(data),
            error: None,
            original_request,
        }
    }

    pub fn failure(error: &Error, original_request: Value) -> Self {
        Self {
            status: 500,
            msg: "error".to_string(),
            data: None,
            error: Some(ErrorDetails::from_error(error)),
            original_request,
        }
    }

    /// A failure that did not produce an [`Error`], such as a panic.
    pub fn internal(kind: &str, description: impl Into<String>, original_request: Value) -> Self {
        let description = description.into();
        Self {
            status: 500,
            msg: "error".to_string(),
            data: None,
            error: Some(ErrorDetails {
                kind: kind.to_string(),
                description: description.clone(),
                trace: vec![description],
            }),
            original_request,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}
