pub mod devices;
pub mod error;
pub mod health;

pub use error::AppError;
