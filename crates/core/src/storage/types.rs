use serde::Serialize;

use crate::device::Device;

/// Result of a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The device was changed; carries the post-update record.
    Updated(Device),
    /// No device has this id.
    NotFound,
    /// The patch held no writable field, so storage was not touched.
    NoChanges,
}

impl UpdateOutcome {
    /// Returns the updated device, if any.
    pub fn into_device(self) -> Option<Device> {
        match self {
            UpdateOutcome::Updated(device) => Some(device),
            UpdateOutcome::NotFound | UpdateOutcome::NoChanges => None,
        }
    }
}

/// Result of a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// A device existed and was removed.
    Removed,
    /// Nothing was stored under this id.
    Absent,
    /// The delete succeeded but the backend cannot tell whether anything
    /// existed beforehand.
    Unreported,
}

impl DeleteOutcome {
    /// Whether a device existed before the delete, where the backend knows.
    pub fn existed(self) -> Option<bool> {
        match self {
            DeleteOutcome::Removed => Some(true),
            DeleteOutcome::Absent => Some(false),
            DeleteOutcome::Unreported => None,
        }
    }
}

/// Semantic differences between backends that callers must tolerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendCapabilities {
    /// `create_device` fails with `AlreadyExists` on an id collision instead
    /// of overwriting.
    pub guards_create_collisions: bool,
    /// `delete_device` reports `Removed`/`Absent` rather than `Unreported`.
    pub reports_delete_existence: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_outcome_existed() {
        assert_eq!(DeleteOutcome::Removed.existed(), Some(true));
        assert_eq!(DeleteOutcome::Absent.existed(), Some(false));
        assert_eq!(DeleteOutcome::Unreported.existed(), None);
    }

    #[test]
    fn test_update_outcome_into_device() {
        let device = Device::new("Fan", "Acme");

        assert_eq!(
            UpdateOutcome::Updated(device.clone()).into_device(),
            Some(device)
        );
        assert_eq!(UpdateOutcome::NotFound.into_device(), None);
        assert_eq!(UpdateOutcome::NoChanges.into_device(), None);
    }
}
