mod error;
mod http_mapping;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use http_mapping::repository_error_to_api_error;
pub use traits::DeviceRepository;
pub use types::{BackendCapabilities, DeleteOutcome, UpdateOutcome};
