//! Request payloads for device operations.
//!
//! Both payloads are built from a raw JSON object so that unknown keys can be
//! dropped instead of rejected. Following the Functional Core pattern, these
//! are pure data types with no I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ValidationError;
use super::operations::validate_field;
use super::types::Device;

/// The only device fields a caller may write.
pub const WRITABLE_FIELDS: [&str; 2] = ["name", "manufacturer"];

/// Request payload for creating a new device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub manufacturer: String,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, manufacturer: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manufacturer: manufacturer.into(),
        }
    }

    /// Builds a payload from a JSON object, ignoring keys outside
    /// [`WRITABLE_FIELDS`].
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let name = required_string(fields, "name")?;
        let manufacturer = required_string(fields, "manufacturer")?;
        let request = Self { name, manufacturer };
        request.validate()?;
        Ok(request)
    }

    /// Checks both fields are non-empty and within length limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_field("name", &self.name)?;
        validate_field("manufacturer", &self.manufacturer)
    }

    /// Materializes the device to store: fresh id, both timestamps "now".
    pub fn into_device(self) -> Device {
        Device::new(self.name, self.manufacturer)
    }
}

/// Partial update of a device.
///
/// Only `name` and `manufacturer` survive construction from a JSON object;
/// everything else (including `id` and the timestamps) is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
}

impl DevicePatch {
    /// Builds a patch from an arbitrary JSON object.
    ///
    /// A writable key set to `null` counts as absent.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ValidationError> {
        let patch = Self {
            name: optional_string(fields, "name")?,
            manufacturer: optional_string(fields, "manufacturer")?,
        };
        patch.validate()?;
        Ok(patch)
    }

    /// Set the new name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the new manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Returns true when no writable field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.manufacturer.is_none()
    }

    /// Present fields as `(attribute, value)` pairs, in a stable order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = Vec::with_capacity(2);
        if let Some(name) = &self.name {
            fields.push(("name", name.as_str()));
        }
        if let Some(manufacturer) = &self.manufacturer {
            fields.push(("manufacturer", manufacturer.as_str()));
        }
        fields
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields() {
            validate_field(field, value)?;
        }
        Ok(())
    }
}

fn required_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    optional_string(fields, field)?.ok_or(ValidationError::Missing { field })
}

fn optional_string(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::NotAString { field }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_new_device_from_fields() {
        let fields = object(json!({"name": "Air Conditioner", "manufacturer": "Acme"}));

        let request = NewDevice::from_fields(&fields).unwrap();

        assert_eq!(request, NewDevice::new("Air Conditioner", "Acme"));
    }

    #[test]
    fn test_new_device_missing_field() {
        let fields = object(json!({"name": "Air Conditioner"}));

        assert_eq!(
            NewDevice::from_fields(&fields),
            Err(ValidationError::Missing {
                field: "manufacturer"
            })
        );
    }

    #[test]
    fn test_new_device_ignores_unknown_keys() {
        let fields = object(json!({
            "name": "Fan",
            "manufacturer": "Acme",
            "id": "client-chosen",
            "color": "red"
        }));

        let device = NewDevice::from_fields(&fields).unwrap().into_device();

        assert_ne!(device.id, "client-chosen");
    }

    #[test]
    fn test_new_device_rejects_non_string() {
        let fields = object(json!({"name": 42, "manufacturer": "Acme"}));

        assert_eq!(
            NewDevice::from_fields(&fields),
            Err(ValidationError::NotAString { field: "name" })
        );
    }

    #[test]
    fn test_patch_drops_disallowed_keys() {
        let fields = object(json!({
            "id": "other",
            "created_at": "2024-01-01T00:00:00Z",
            "serial": "XYZ"
        }));

        let patch = DevicePatch::from_fields(&fields).unwrap();

        assert!(patch.is_empty());
        assert!(patch.fields().is_empty());
    }

    #[test]
    fn test_patch_keeps_writable_keys_in_order() {
        let fields = object(json!({"manufacturer": "Acme2", "name": "AC"}));

        let patch = DevicePatch::from_fields(&fields).unwrap();

        assert_eq!(patch.fields(), vec![("name", "AC"), ("manufacturer", "Acme2")]);
    }

    #[test]
    fn test_patch_null_counts_as_absent() {
        let fields = object(json!({"name": null, "manufacturer": "Acme2"}));

        let patch = DevicePatch::from_fields(&fields).unwrap();

        assert_eq!(patch, DevicePatch::default().with_manufacturer("Acme2"));
    }

    #[test]
    fn test_patch_rejects_blank_value() {
        let fields = object(json!({"name": ""}));

        assert_eq!(
            DevicePatch::from_fields(&fields),
            Err(ValidationError::Empty { field: "name" })
        );
    }
}
