use crate::context::ErrorContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Category of a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Structural,
    NotFound,
    Computation,
    Storage,
    Configuration,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Structural => "structural_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Computation => "computation_error",
            ErrorKind::Storage => "storage_error",
            ErrorKind::Configuration => "configuration_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured, user-visible error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Unique id for correlating the report with log lines
    pub error_id: Uuid,
    pub error_type: ErrorKind,
    /// Stable code from [`crate::codes`]
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "ErrorContext::is_empty", default)]
    pub context: ErrorContext,
    pub timestamp: DateTime<Utc>,
}

impl ErrorReport {
    pub fn new(kind: ErrorKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            error_id: Uuid::new_v4(),
            error_type: kind,
            code: code.to_string(),
            message: message.into(),
            context: ErrorContext::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Serialize the report as a JSON string
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a context value cannot be encoded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Errors that can describe themselves as an [`ErrorReport`]
pub trait Reportable {
    fn report(&self) -> ErrorReport;
}
