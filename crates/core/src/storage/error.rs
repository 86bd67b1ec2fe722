use thiserror::Error;

/// Errors that can occur during repository operations.
///
/// There is no not-found variant: a missing device is reported through
/// `Option` and the outcome enums, not as a failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
