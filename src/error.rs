use crate::error_kind::ErrorKind;
use crate::transport::TransportError;
use serde::Serialize;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "config.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "task_poller")
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

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A failure mapped onto the four-kind taxonomy the UI branches on.
///
/// Produced once, as close to the failure site as possible, and never re-wrapped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            status,
        }
    }

    /// Pre-flight failure: the caller must fix its input.
    pub fn param(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Param, message, None)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::System, message, None)
    }

    /// The error reported when a poll loop runs past its budget.
    pub fn task_timeout() -> Self {
        Self::system("task timeout")
    }
}

/// Unified error type for infrastructure failures.
///
/// Operation calls never return this directly; they run it through
/// [`classify`](crate::classify) first.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Classified(ClassifiedError),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
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
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<ClassifiedError> for Error {
    fn from(err: ClassifiedError) -> Self {
        Error::Classified(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_renders_all_parts() {
        let err = Error::configuration_with_context(
            "invalid base url",
            ErrorContext::new()
                .with_field_path("config.base_url")
                .with_source("config_loader"),
        );
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid base url (field: config.base_url, source: config_loader)"
        );
        assert_eq!(
            err.context().and_then(|c| c.source.as_deref()),
            Some("config_loader")
        );
    }

    #[test]
    fn classified_error_displays_message_only() {
        let err = ClassifiedError::new(ErrorKind::Expired, "stale (request_id=abc)", Some(409));
        assert_eq!(err.to_string(), "stale (request_id=abc)");
        assert_eq!(Error::from(err.clone()).to_string(), err.message);
    }

    #[test]
    fn classified_error_serializes_lowercase_kind() {
        let json = serde_json::to_value(ClassifiedError::param("node required")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "param", "message": "node required"}));
    }
}
