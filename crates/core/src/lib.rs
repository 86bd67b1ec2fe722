//! Core domain for devicehub.
//!
//! Pure types and functions with no I/O: the device model, the repository
//! contract every storage backend implements, and the error taxonomy that
//! backends' failures are translated into.

pub mod device;
pub mod error;
pub mod storage;
