use thiserror::Error;

/// Boxed cause attached to domain errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "lambda_functions[2].name")
    pub field_path: Option<String>,
    /// Function the failing operation was working on
    pub target: Option<String>,
    /// Status code reported by a collaborator, when there was one
    pub status_code: Option<u16>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "metrics_collector")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_status_code(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Discriminant shared by every [`Error`]; this is what the response envelope reports as `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRequest,
    LoadConfigFailed,
    ConfigValidationFailed,
    GetMetricsFailed,
    GetSettingsFailed,
    ForecastError,
    TransportFailed,
    SerializationFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::LoadConfigFailed => "LoadConfigFailed",
            ErrorKind::ConfigValidationFailed => "ConfigValidationFailed",
            ErrorKind::GetMetricsFailed => "GetMetricsFailed",
            ErrorKind::GetSettingsFailed => "GetSettingsFailed",
            ErrorKind::ForecastError => "ForecastError",
            ErrorKind::TransportFailed => "TransportFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the warm-up pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {message}{}", format_context(.context))]
    InvalidRequest {
        message: String,
        context: ErrorContext,
    },

    #[error("Failed to load warm-up configuration: {message}{}", format_context(.context))]
    LoadConfig {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Configuration validation failed: {message}{}", format_context(.context))]
    ConfigValidation {
        message: String,
        context: ErrorContext,
    },

    #[error("Failed to get metrics: {message}{}", format_context(.context))]
    GetMetrics {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Failed to get settings: {message}{}", format_context(.context))]
    GetSettings {
        message: String,
        context: ErrorContext,
        #[source]
        cause: Option<BoxError>,
    },

    #[error("Forecast error: {message}{}", format_context(.context))]
    Forecast {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref target) = ctx.target {
        parts.push(format!("target: {}", target));
    }
    if let Some(status) = ctx.status_code {
        parts.push(format!("status: {}", status));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Error::InvalidRequest {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn load_config(msg: impl Into<String>) -> Self {
        Error::LoadConfig {
            message: msg.into(),
            context: ErrorContext::new(),
            cause: None,
        }
    }

    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn get_metrics(msg: impl Into<String>) -> Self {
        Error::GetMetrics {
            message: msg.into(),
            context: ErrorContext::new(),
            cause: None,
        }
    }

    pub fn get_settings(msg: impl Into<String>) -> Self {
        Error::GetSettings {
            message: msg.into(),
            context: ErrorContext::new(),
            cause: None,
        }
    }

    pub fn forecast(msg: impl Into<String>) -> Self {
        Error::Forecast {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Replace the structured context of a domain error. Plumbing errors are returned unchanged.
    pub fn with_context(mut self, ctx: ErrorContext) -> Self {
        match &mut self {
            Error::InvalidRequest { context, .. }
            | Error::LoadConfig { context, .. }
            | Error::ConfigValidation { context, .. }
            | Error::GetMetrics { context, .. }
            | Error::GetSettings { context, .. }
            | Error::Forecast { context, .. } => *context = ctx,
            Error::Transport(_) | Error::Serialization(_) => {}
        }
        self
    }

    /// Attach the underlying cause for error kinds that wrap a collaborator failure.
    pub fn with_cause(mut self, err: impl Into<BoxError>) -> Self {
        match &mut self {
            Error::LoadConfig { cause, .. }
            | Error::GetMetrics { cause, .. }
            | Error::GetSettings { cause, .. } => *cause = Some(err.into()),
            _ => {}
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Error::LoadConfig { .. } => ErrorKind::LoadConfigFailed,
            Error::ConfigValidation { .. } => ErrorKind::ConfigValidationFailed,
            Error::GetMetrics { .. } => ErrorKind::GetMetricsFailed,
            Error::GetSettings { .. } => ErrorKind::GetSettingsFailed,
            Error::Forecast { .. } => ErrorKind::ForecastError,
            Error::Transport(_) => ErrorKind::TransportFailed,
            Error::Serialization(_) => ErrorKind::SerializationFailed,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::InvalidRequest { context, .. }
            | Error::LoadConfig { context, .. }
            | Error::ConfigValidation { context, .. }
            | Error::GetMetrics { context, .. }
            | Error::GetSettings { context, .. }
            | Error::Forecast { context, .. } => Some(context),
            Error::Transport(_) | Error::Serialization(_) => None,
        }
    }
}
