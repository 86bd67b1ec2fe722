use async_trait::async_trait;

use crate::device::{Device, DevicePatch, NewDevice};

use super::{BackendCapabilities, DeleteOutcome, Result, UpdateOutcome};

/// Repository for device operations.
///
/// Every call is a fresh round trip to the backend; no handle to a stored
/// record outlives the call that returned it.
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Short name of the backend, for logs and health output.
    fn backend_name(&self) -> &'static str;

    /// How this backend's semantics differ from the others.
    fn capabilities(&self) -> BackendCapabilities;

    /// Creates a device with a generated id and returns the stored record.
    async fn create_device(&self, new_device: &NewDevice) -> Result<Device>;

    /// Gets a device by its ID.
    async fn get_device(&self, id: &str) -> Result<Option<Device>>;

    /// Applies the writable fields of `patch` and refreshes `updated_at`.
    async fn update_device(&self, id: &str, patch: &DevicePatch) -> Result<UpdateOutcome>;

    /// Deletes a device by its ID.
    async fn delete_device(&self, id: &str) -> Result<DeleteOutcome>;

    /// Lists every device. There is no pagination.
    async fn list_devices(&self) -> Result<Vec<Device>>;

    /// Verifies the backend can serve requests.
    async fn health_check(&self) -> Result<()>;

    /// Releases backend resources at process exit.
    async fn shutdown(&self) {}
}
