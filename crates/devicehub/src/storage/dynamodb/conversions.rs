//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and domain types.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use devicehub_core::device::Device;
use devicehub_core::storage::RepositoryError;

/// Partition key attribute of the devices table.
pub const KEY_ATTRIBUTE: &str = "id";

/// Build the primary key for a device id.
pub fn device_key(id: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([(KEY_ATTRIBUTE.to_string(), AttributeValue::S(id.to_string()))])
}

/// Convert a Device to DynamoDB item.
pub fn device_to_item(device: &Device) -> HashMap<String, AttributeValue> {
    let mut item = device_key(&device.id);

    item.insert("name".to_string(), AttributeValue::S(device.name.clone()));
    item.insert(
        "manufacturer".to_string(),
        AttributeValue::S(device.manufacturer.clone()),
    );
    item.insert(
        "created_at".to_string(),
        AttributeValue::S(format_datetime(&device.created_at)),
    );
    item.insert(
        "updated_at".to_string(),
        AttributeValue::S(format_datetime(&device.updated_at)),
    );

    item
}

/// Convert a DynamoDB item to Device.
pub fn item_to_device(item: &HashMap<String, AttributeValue>) -> Result<Device, RepositoryError> {
    Ok(Device {
        id: get_string(item, KEY_ATTRIBUTE)?,
        name: get_string(item, "name")?,
        manufacturer: get_string(item, "manufacturer")?,
        created_at: get_datetime(item, "created_at")?,
        updated_at: get_datetime(item, "updated_at")?,
    })
}

/// Format a timestamp as stored in DynamoDB.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_device() -> Device {
        Device {
            id: "550e8400-e29b-41d4-a716-446655440001".to_string(),
            name: "Air Conditioner".to_string(),
            manufacturer: "Acme".to_string(),
            created_at: DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339("2024-01-16T08:00:00.5Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    #[test]
    fn test_device_key() {
        let key = device_key("abc");

        assert_eq!(key.len(), 1);
        assert_eq!(key.get("id").unwrap().as_s().unwrap(), "abc");
    }

    #[test]
    fn test_device_to_item() {
        let item = device_to_item(&sample_device());

        assert_eq!(item.len(), 5);
        assert_eq!(item.get("name").unwrap().as_s().unwrap(), "Air Conditioner");
        assert_eq!(
            item.get("created_at").unwrap().as_s().unwrap(),
            "2024-01-15T10:30:00.000000000Z"
        );
    }

    #[test]
    fn test_item_to_device_restores_device() {
        let device = sample_device();

        let restored = item_to_device(&device_to_item(&device)).unwrap();

        assert_eq!(restored, device);
    }

    #[test]
    fn test_item_missing_field() {
        let mut item = device_to_item(&sample_device());
        item.remove("manufacturer");

        let result = item_to_device(&item);

        assert!(matches!(result, Err(RepositoryError::InvalidData(msg)) if msg.contains("manufacturer")));
    }

    #[test]
    fn test_item_wrong_attribute_type() {
        let mut item = device_to_item(&sample_device());
        item.insert("name".to_string(), AttributeValue::N("42".to_string()));

        assert!(matches!(
            item_to_device(&item),
            Err(RepositoryError::InvalidData(_))
        ));
    }

    #[test]
    fn test_item_invalid_datetime() {
        let mut item = device_to_item(&sample_device());
        item.insert(
            "updated_at".to_string(),
            AttributeValue::S("yesterday".to_string()),
        );

        assert!(matches!(
            item_to_device(&item),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
