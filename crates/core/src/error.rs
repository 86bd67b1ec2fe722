//! The API error contract.
//!
//! Every failure that reaches a caller is one of four [`ErrorKind`]s, each
//! with a stable machine-readable code. The rendered form is the
//! [`ErrorEnvelope`]: `{"error": {"code", "message", "details"}}`.
//!
//! Backend-native failure text is kept in [`ApiError::diagnostic`] for logging
//! and is never part of the envelope.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::device::ValidationError;

/// Closed set of domain error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Storage,
    Internal,
}

impl ErrorKind {
    /// Stable code carried in the envelope.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "DEVICE_NOT_FOUND",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Storage => "DATABASE_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation => 400,
            ErrorKind::Storage | ErrorKind::Internal => 500,
        }
    }
}

/// A classified failure ready to be rendered at the boundary.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{}: {message}", .kind.code())]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    details: Map<String, Value>,
    diagnostic: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
            diagnostic: None,
        }
    }

    /// The target device does not exist.
    pub fn not_found(device_id: &str) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("Device not found: {device_id}"),
        )
        .with_detail("device_id", device_id)
    }

    /// A storage failure. `diagnostic` is the backend's own description.
    pub fn storage(message: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message).with_diagnostic(diagnostic)
    }

    /// Anything that could not be categorized.
    pub fn internal(diagnostic: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "Internal server error").with_diagnostic(diagnostic)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &Map<String, Value> {
        &self.details
    }

    /// Internal-only description of the underlying failure.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Sanitized, serializable form of this error.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.message.clone(),
                details: Value::Object(self.details.clone()),
            },
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let mut api_error = ApiError::new(ErrorKind::Validation, err.to_string());
        if let Some(field) = err.field() {
            api_error = api_error.with_detail("field", field);
        }
        let reason = match &err {
            ValidationError::Missing { .. } => json!("missing"),
            ValidationError::Empty { .. } => json!("empty"),
            ValidationError::TooLong { max, .. } => json!({ "max_length": max }),
            ValidationError::NotAString { .. } => json!("not_a_string"),
            ValidationError::MalformedId(_) => json!("malformed"),
            ValidationError::MalformedBody(_) => json!("malformed_body"),
        };
        api_error.with_detail("reason", reason)
    }
}

/// Wire form of an error: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub details: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes_are_stable() {
        assert_eq!(ErrorKind::NotFound.code(), "DEVICE_NOT_FOUND");
        assert_eq!(ErrorKind::Validation.code(), "VALIDATION_ERROR");
        assert_eq!(ErrorKind::Storage.code(), "DATABASE_ERROR");
        assert_eq!(ErrorKind::Internal.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_kind_status_codes() {
        assert_eq!(ErrorKind::NotFound.status_code(), 404);
        assert_eq!(ErrorKind::Validation.status_code(), 400);
        assert_eq!(ErrorKind::Storage.status_code(), 500);
        assert_eq!(ErrorKind::Internal.status_code(), 500);
    }

    #[test]
    fn test_not_found_envelope() {
        let envelope = ApiError::not_found("abc-123").to_envelope();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            json,
            json!({
                "error": {
                    "code": "DEVICE_NOT_FOUND",
                    "message": "Device not found: abc-123",
                    "details": {"device_id": "abc-123"}
                }
            })
        );
    }

    #[test]
    fn test_diagnostic_is_not_serialized() {
        let error = ApiError::storage("Database operation failed", "near \"SELEC\": syntax error");
        let json = serde_json::to_string(&error.to_envelope()).unwrap();

        assert_eq!(error.diagnostic(), Some("near \"SELEC\": syntax error"));
        assert!(!json.contains("SELEC"));
        assert!(json.contains("DATABASE_ERROR"));
    }

    #[test]
    fn test_validation_error_translation() {
        let error = ApiError::from(ValidationError::Missing { field: "name" });

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.message(), "name is required");
        assert_eq!(error.details()["field"], "name");
        assert_eq!(error.details()["reason"], "missing");
    }

    #[test]
    fn test_internal_error_hides_cause() {
        let error = ApiError::internal("task panicked");

        assert_eq!(error.message(), "Internal server error");
        assert_eq!(error.to_envelope().error.details, json!({}));
    }

    #[test]
    fn test_display_includes_code() {
        let error = ApiError::not_found("x");
        assert_eq!(error.to_string(), "DEVICE_NOT_FOUND: Device not found: x");
    }
}
