//! DynamoDB repository implementation.
//!
//! Implements [`DeviceRepository`] using a single DynamoDB table keyed by
//! device id.
//!
//! Writes through PutItem are unconditional, so creating a device whose id
//! already exists replaces it, and DeleteItem does not report whether
//! anything was removed. Both are surfaced through [`BackendCapabilities`].
//!
//! Updates never move `updated_at` before `created_at`: if the local clock
//! is behind, the update is retried once with `updated_at = created_at`.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, ReturnValuesOnConditionCheckFailure};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};

use devicehub_core::device::{Device, DevicePatch, NewDevice};
use devicehub_core::storage::{
    BackendCapabilities, DeleteOutcome, DeviceRepository, RepositoryError, Result, UpdateOutcome,
};

use super::client::{create_client, DynamoDbConfig};
use super::conversions::{device_key, device_to_item, item_to_device, KEY_ATTRIBUTE};
use super::error::{
    map_describe_table_error, map_get_item_error, map_put_item_error, map_scan_error,
};
use super::expressions::{build_update_expression, UPDATE_CONDITION};
use super::outcomes::{collect_scan_pages, delete_outcome, update_attempt, ScanPage, UpdateAttempt};

/// DynamoDB-based device repository.
pub struct DynamoDbRepository {
    client: Client,
    table_name: String,
}

impl DynamoDbRepository {
    /// Creates a new repository with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a new repository with a client built from `config`.
    pub async fn from_config(config: &DynamoDbConfig) -> Self {
        let client = create_client(config).await;
        tracing::info!(
            table = %config.table_name,
            target = %config.target_display(),
            "DynamoDB client created"
        );
        Self::new(client, config.table_name.clone())
    }

    /// Issue one UpdateItem guarded by [`UPDATE_CONDITION`].
    async fn conditional_update(
        &self,
        id: &str,
        patch: &DevicePatch,
        updated_at: &DateTime<Utc>,
    ) -> Result<UpdateAttempt> {
        let Some(update) = build_update_expression(patch, updated_at) else {
            return Ok(UpdateAttempt::Finished(UpdateOutcome::NoChanges));
        };

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, AttributeValue::S(id.to_string()))
            .update_expression(update.expression)
            .set_expression_attribute_names(Some(update.names))
            .set_expression_attribute_values(Some(update.values))
            .condition_expression(UPDATE_CONDITION)
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld)
            .send()
            .await;

        update_attempt(result, id)
    }
}

#[async_trait]
impl DeviceRepository for DynamoDbRepository {
    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            guards_create_collisions: false,
            reports_delete_existence: false,
        }
    }

    async fn create_device(&self, new_device: &NewDevice) -> Result<Device> {
        let device = new_device.clone().into_device();

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(device_to_item(&device)))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, "Device", device.id.clone()))?;

        tracing::info!(device_id = %device.id, "Device created");
        Ok(device)
    }

    async fn get_device(&self, id: &str) -> Result<Option<Device>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(device_key(id)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => Ok(Some(item_to_device(&item)?)),
            None => {
                tracing::info!(device_id = %id, "Device not found");
                Ok(None)
            }
        }
    }

    async fn update_device(&self, id: &str, patch: &DevicePatch) -> Result<UpdateOutcome> {
        if patch.is_empty() {
            tracing::warn!(device_id = %id, "Update requested with no updatable fields");
            return Ok(UpdateOutcome::NoChanges);
        }

        let outcome = match self.conditional_update(id, patch, &Utc::now()).await? {
            UpdateAttempt::Finished(outcome) => outcome,
            UpdateAttempt::ClockBehind { created_at } => {
                tracing::warn!(
                    device_id = %id,
                    created_at = %created_at,
                    "Clock is behind created_at, clamping updated_at"
                );
                match self.conditional_update(id, patch, &created_at).await? {
                    UpdateAttempt::Finished(outcome) => outcome,
                    UpdateAttempt::ClockBehind { .. } => {
                        return Err(RepositoryError::QueryFailed(format!(
                            "updated_at for device {id} still precedes created_at"
                        )));
                    }
                }
            }
        };

        match &outcome {
            UpdateOutcome::Updated(_) => tracing::info!(device_id = %id, "Device updated"),
            UpdateOutcome::NotFound => {
                tracing::info!(device_id = %id, "Device not found for update")
            }
            UpdateOutcome::NoChanges => {}
        }
        Ok(outcome)
    }

    async fn delete_device(&self, id: &str) -> Result<DeleteOutcome> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(device_key(id)))
            .send()
            .await;

        let outcome = delete_outcome(result)?;
        tracing::info!(device_id = %id, "Device delete issued");
        Ok(outcome)
    }

    async fn list_devices(&self) -> Result<Vec<Device>> {
        let devices = collect_scan_pages(|exclusive_start_key| async move {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await
                .map_err(map_scan_error)?;

            Ok(ScanPage {
                items: output.items.unwrap_or_default(),
                last_evaluated_key: output.last_evaluated_key,
            })
        })
        .await?;

        tracing::info!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| map_describe_table_error(e, &self.table_name))?;
        Ok(())
    }
}
