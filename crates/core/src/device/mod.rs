mod error;
mod operations;
mod requests;
mod types;

pub use error::ValidationError;
pub use operations::{validate_device_id, validate_field};
pub use requests::{DevicePatch, NewDevice, WRITABLE_FIELDS};
pub use types::{Device, MAX_ID_LEN, MAX_TEXT_LEN};
