//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of `DeviceRepository`
//! using `aws-sdk-dynamodb`.

mod client;
mod conversions;
mod error;
mod expressions;
mod outcomes;
mod repository;

pub use client::DynamoDbConfig;
pub use repository::DynamoDbRepository;
