use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a device id (hyphenated UUID).
pub const MAX_ID_LEN: usize = 36;

/// Maximum length of `name` and `manufacturer`.
pub const MAX_TEXT_LEN: usize = 255;

/// A piece of equipment tracked by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Creates a new device with a fresh id.
    ///
    /// "Now" is captured once so that `created_at == updated_at`.
    pub fn new(name: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets a specific ID for this device (useful for testing).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_has_matching_timestamps() {
        let device = Device::new("Air Conditioner", "Acme");

        assert_eq!(device.created_at, device.updated_at);
        assert_eq!(device.name, "Air Conditioner");
        assert_eq!(device.manufacturer, "Acme");
    }

    #[test]
    fn test_new_device_id_is_hyphenated_uuid() {
        let device = Device::new("Router", "Netgear");

        assert_eq!(device.id.len(), MAX_ID_LEN);
        assert!(Uuid::parse_str(&device.id).is_ok());
    }

    #[test]
    fn test_new_devices_get_distinct_ids() {
        let a = Device::new("a", "b");
        let b = Device::new("a", "b");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_device_serializes_snake_case_fields() {
        let device = Device::new("Fan", "Acme").with_id("device-1");
        let json = serde_json::to_value(&device).unwrap();

        assert_eq!(json["id"], "device-1");
        assert_eq!(json["manufacturer"], "Acme");
        assert!(json["created_at"].is_string());
        assert!(json["updated_at"].is_string());
    }
}
