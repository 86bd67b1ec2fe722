//! Device CRUD handlers under `/api/devices`.
//!
//! Bodies are parsed as a generic JSON object first so that unknown keys are
//! ignored and type errors report the offending field.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Map, Value};

use devicehub_core::device::{
    validate_device_id, Device, DevicePatch, NewDevice, ValidationError, WRITABLE_FIELDS,
};
use devicehub_core::error::{ApiError, ErrorKind};
use devicehub_core::storage::{DeleteOutcome, UpdateOutcome};

use crate::{handlers::AppError, state::AppState};

/// Unwrap a JSON body that must be an object.
fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    let Json(value) = body.map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))?;
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(ValidationError::MalformedBody("expected a JSON object".to_string()).into()),
    }
}

fn no_updatable_fields() -> ApiError {
    ApiError::new(ErrorKind::Validation, "No updatable fields supplied")
        .with_detail("allowed_fields", json!(WRITABLE_FIELDS))
}

/// List all devices (GET /api/devices).
pub async fn list_devices(State(state): State<AppState>) -> Result<Json<Vec<Device>>, AppError> {
    let devices = state.repository.list_devices().await?;
    Ok(Json(devices))
}

/// Create a new device (POST /api/devices).
pub async fn create_device(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Device>), AppError> {
    let fields = json_object(body)?;
    let new_device = NewDevice::from_fields(&fields)?;

    let device = state.repository.create_device(&new_device).await?;

    Ok((StatusCode::CREATED, Json(device)))
}

/// Get a single device by ID (GET /api/devices/{id}).
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Device>, AppError> {
    validate_device_id(&id)?;

    state
        .repository
        .get_device(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(&id).into())
}

/// Update a device by ID (PUT/PATCH /api/devices/{id}).
///
/// Only the supplied writable fields change.
pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Device>, AppError> {
    validate_device_id(&id)?;
    let fields = json_object(body)?;
    let patch = DevicePatch::from_fields(&fields)?;

    match state.repository.update_device(&id, &patch).await? {
        UpdateOutcome::Updated(device) => Ok(Json(device)),
        UpdateOutcome::NotFound => Err(ApiError::not_found(&id).into()),
        UpdateOutcome::NoChanges => Err(no_updatable_fields().into()),
    }
}

/// Delete a device by ID (DELETE /api/devices/{id}).
///
/// Backends that cannot tell whether the device existed always report
/// success.
pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    validate_device_id(&id)?;

    match state.repository.delete_device(&id).await? {
        DeleteOutcome::Removed | DeleteOutcome::Unreported => Ok(Json(json!({
            "message": "Device deleted successfully",
            "device_id": id,
        }))),
        DeleteOutcome::Absent => Err(ApiError::not_found(&id).into()),
    }
}
