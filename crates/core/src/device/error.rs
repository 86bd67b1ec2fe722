use thiserror::Error;

/// Errors raised when a device payload or identifier is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("{field} too long (max {max} characters)")]
    TooLong { field: &'static str, max: usize },
    #[error("{field} must be a string")]
    NotAString { field: &'static str },
    #[error("Invalid device id: {0}")]
    MalformedId(String),
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}

impl ValidationError {
    /// Name of the offending field, if the error is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::Missing { field }
            | ValidationError::Empty { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::NotAString { field } => Some(field),
            ValidationError::MalformedId(_) => Some("id"),
            ValidationError::MalformedBody(_) => None,
        }
    }
}
