//! Translation of repository errors into the API error contract.
//!
//! Pure functions, no side effects. The backend's own message only travels as
//! the internal diagnostic.

use crate::error::ApiError;

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an [`ApiError`] of kind Storage.
///
/// # Examples
///
/// ```
/// use devicehub_core::error::ErrorKind;
/// use devicehub_core::storage::{repository_error_to_api_error, RepositoryError};
///
/// let error = RepositoryError::QueryFailed("disk I/O error".to_string());
/// let api_error = repository_error_to_api_error(&error);
/// assert_eq!(api_error.kind(), ErrorKind::Storage);
/// assert_eq!(api_error.message(), "Database operation failed");
/// ```
pub fn repository_error_to_api_error(error: &RepositoryError) -> ApiError {
    let message = match error {
        RepositoryError::Unavailable(_) => "Storage is temporarily unavailable",
        RepositoryError::AlreadyExists { .. } => "Device could not be stored",
        RepositoryError::QueryFailed(_) | RepositoryError::InvalidData(_) => {
            "Database operation failed"
        }
    };
    ApiError::storage(message, error.to_string())
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        repository_error_to_api_error(&error)
    }
}
