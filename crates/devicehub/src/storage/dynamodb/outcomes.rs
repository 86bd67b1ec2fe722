//! Interpretation of DynamoDB responses.
//!
//! The repository sends requests; the functions here decide what a response
//! (or a failure) means for the caller. They take plain SDK values so they
//! can be exercised without a table.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemError, DeleteItemOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemError, UpdateItemOutput};
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};

use devicehub_core::device::Device;
use devicehub_core::storage::{DeleteOutcome, RepositoryError, Result, UpdateOutcome};

use super::conversions::item_to_device;
use super::error::{map_delete_item_error, map_update_item_error};

type Item = HashMap<String, AttributeValue>;

/// One page of a Scan response.
#[derive(Debug, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    pub last_evaluated_key: Option<Item>,
}

/// Fetch scan pages until DynamoDB stops returning a continuation key.
///
/// `fetch_page` receives the exclusive start key for the next page, `None`
/// for the first one. An empty key ends the scan like a missing one.
pub async fn collect_scan_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Device>>
where
    F: FnMut(Option<Item>) -> Fut,
    Fut: Future<Output = Result<ScanPage>>,
{
    let mut devices = Vec::new();
    let mut exclusive_start_key = None;

    loop {
        let page = fetch_page(exclusive_start_key.take()).await?;

        for item in &page.items {
            devices.push(item_to_device(item)?);
        }

        match page.last_evaluated_key {
            Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
            _ => break,
        }
    }

    Ok(devices)
}

/// What a single conditional UpdateItem call amounted to.
#[derive(Debug, PartialEq)]
pub enum UpdateAttempt {
    Finished(UpdateOutcome),
    /// The device exists but the timestamp precedes its `created_at`.
    ClockBehind { created_at: DateTime<Utc> },
}

/// Interpret the result of a conditional UpdateItem.
///
/// A failed condition with no old item means the device is missing. With an
/// old item present the device exists, so the `created_at` guard tripped.
pub fn update_attempt<R: Debug + Send + Sync + 'static>(
    result: std::result::Result<UpdateItemOutput, SdkError<UpdateItemError, R>>,
    id: &str,
) -> Result<UpdateAttempt> {
    let err = match result {
        Ok(output) => {
            let attributes = output.attributes.ok_or_else(|| {
                RepositoryError::InvalidData(format!(
                    "UpdateItem returned no attributes for device {id}"
                ))
            })?;
            return Ok(UpdateAttempt::Finished(UpdateOutcome::Updated(
                item_to_device(&attributes)?,
            )));
        }
        Err(err) => err,
    };

    if let Some(UpdateItemError::ConditionalCheckFailedException(e)) = err.as_service_error() {
        return match e.item() {
            Some(item) => Ok(UpdateAttempt::ClockBehind {
                created_at: item_to_device(item)?.created_at,
            }),
            None => Ok(UpdateAttempt::Finished(UpdateOutcome::NotFound)),
        };
    }

    Err(map_update_item_error(err))
}

/// Interpret the result of a DeleteItem.
///
/// DeleteItem succeeds whether or not the item existed.
pub fn delete_outcome<R: Debug + Send + Sync + 'static>(
    result: std::result::Result<DeleteItemOutput, SdkError<DeleteItemError, R>>,
) -> Result<DeleteOutcome> {
    result
        .map(|_| DeleteOutcome::Unreported)
        .map_err(map_delete_item_error)
}
