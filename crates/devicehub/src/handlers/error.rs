use std::any::Any;

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use devicehub_core::error::{ApiError, ErrorKind};

/// Handler error that renders as the JSON error envelope.
///
/// Anything convertible into `ApiError` (validation and repository errors
/// included) can be propagated with `?`.
#[derive(Debug)]
pub struct AppError(pub ApiError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.0;

        match error.kind() {
            ErrorKind::Storage | ErrorKind::Internal => tracing::error!(
                code = error.code(),
                diagnostic = error.diagnostic().unwrap_or_default(),
                "{}",
                error.message()
            ),
            ErrorKind::NotFound | ErrorKind::Validation => tracing::debug!(
                code = error.code(),
                "{}",
                error.message()
            ),
        }

        let status_code = StatusCode::from_u16(error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, Json(error.to_envelope())).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<ApiError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Router fallback for paths that match no route.
pub async fn route_not_found(uri: Uri) -> AppError {
    AppError(
        ApiError::new(ErrorKind::NotFound, format!("No route for {}", uri.path()))
            .with_detail("path", uri.path()),
    )
}

/// Fallback for a known path requested with an unsupported method.
pub async fn method_not_allowed(method: Method, uri: Uri) -> (StatusCode, AppError) {
    let error = ApiError::new(
        ErrorKind::Validation,
        format!("Method {method} not allowed for {}", uri.path()),
    )
    .with_detail("method", method.as_str())
    .with_detail("path", uri.path());

    (StatusCode::METHOD_NOT_ALLOWED, AppError(error))
}

/// Renders a handler panic as an `INTERNAL_ERROR` envelope.
///
/// The panic payload is only logged.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError(ApiError::internal(format!("handler panicked: {detail}"))).into_response()
}
