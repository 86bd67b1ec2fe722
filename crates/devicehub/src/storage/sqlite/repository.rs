//! SQLite repository implementation.
//!
//! Implements [`DeviceRepository`] on top of a [`SqlitePool`]. Every
//! operation checks a connection out of the pool and returns it on all exit
//! paths.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use devicehub_core::device::{Device, DevicePatch, NewDevice};
use devicehub_core::storage::{
    BackendCapabilities, DeleteOutcome, DeviceRepository, Result, UpdateOutcome,
};

use super::conversions::{format_datetime, row_to_device};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id, wrap_err};
use super::pool::SqlitePool;
use super::schema;

/// SQLite-based device repository.
pub struct SqliteRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Creates the devices table and its indexes if they are missing.
    pub async fn init_schema(&self) -> Result<()> {
        self.pool
            .run(|conn| conn.execute_batch(schema::CREATE_TABLES))
            .await?;
        tracing::debug!("Device schema ready");
        Ok(())
    }

    /// Inserts a fully formed device. An existing id is rejected with
    /// `AlreadyExists`.
    async fn insert(&self, device: Device) -> Result<Device> {
        let device_id = device.id.clone();
        let conn = self.pool.acquire().await?;

        let result = conn
            .call(move |conn| {
                conn.query_row(
                    schema::INSERT_DEVICE,
                    rusqlite::params![
                        device.id,
                        device.name,
                        device.manufacturer,
                        format_datetime(&device.created_at),
                        format_datetime(&device.updated_at),
                    ],
                    row_to_device,
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Device", device_id));

        conn.release();
        result
    }
}

#[async_trait]
impl DeviceRepository for SqliteRepository {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            guards_create_collisions: true,
            reports_delete_existence: true,
        }
    }

    async fn create_device(&self, new_device: &NewDevice) -> Result<Device> {
        let device = self.insert(new_device.clone().into_device()).await?;
        tracing::info!(device_id = %device.id, "Device created");
        Ok(device)
    }

    async fn get_device(&self, id: &str) -> Result<Option<Device>> {
        let id_str = id.to_string();
        let conn = self.pool.acquire().await?;

        let result = conn
            .call(move |conn| {
                match conn.query_row(schema::SELECT_DEVICE_BY_ID, [&id_str], row_to_device) {
                    Ok(device) => Ok(Some(device)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Device", id));
        conn.release();

        let device = result?;
        if device.is_none() {
            tracing::info!(device_id = %id, "Device not found");
        }
        Ok(device)
    }

    async fn update_device(&self, id: &str, patch: &DevicePatch) -> Result<UpdateOutcome> {
        if patch.is_empty() {
            tracing::warn!(device_id = %id, "Update requested with no updatable fields");
            return Ok(UpdateOutcome::NoChanges);
        }

        let id_str = id.to_string();
        let name = patch.name.clone();
        let manufacturer = patch.manufacturer.clone();
        let updated_at = format_datetime(&Utc::now());
        let conn = self.pool.acquire().await?;

        let result = conn
            .call(move |conn| {
                match conn.query_row(
                    schema::UPDATE_DEVICE,
                    rusqlite::params![id_str, name, manufacturer, updated_at],
                    row_to_device,
                ) {
                    Ok(device) => Ok(Some(device)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "Device", id));
        conn.release();

        match result? {
            Some(device) => {
                tracing::info!(device_id = %id, "Device updated");
                Ok(UpdateOutcome::Updated(device))
            }
            None => {
                tracing::info!(device_id = %id, "Device not found for update");
                Ok(UpdateOutcome::NotFound)
            }
        }
    }

    async fn delete_device(&self, id: &str) -> Result<DeleteOutcome> {
        let id_str = id.to_string();
        let rows = self
            .pool
            .run(move |conn| conn.execute(schema::DELETE_DEVICE, [&id_str]))
            .await?;

        if rows > 0 {
            tracing::info!(device_id = %id, "Device deleted");
            Ok(DeleteOutcome::Removed)
        } else {
            tracing::info!(device_id = %id, "Device not found for delete");
            Ok(DeleteOutcome::Absent)
        }
    }

    async fn list_devices(&self) -> Result<Vec<Device>> {
        let conn = self.pool.acquire().await?;

        let result = conn
            .call(|conn| {
                let mut stmt = conn.prepare(schema::SELECT_ALL_DEVICES).map_err(wrap_err)?;
                let rows = stmt.query_map([], row_to_device).map_err(wrap_err)?;

                let mut devices = Vec::new();
                for row_result in rows {
                    devices.push(row_result.map_err(wrap_err)?);
                }
                Ok(devices)
            })
            .await
            .map_err(map_tokio_rusqlite_error);
        conn.release();

        let devices = result?;
        tracing::info!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn health_check(&self) -> Result<()> {
        // Acquiring checks the connection and reconnects when needed.
        self.pool.acquire().await?.release();
        Ok(())
    }

    async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}
