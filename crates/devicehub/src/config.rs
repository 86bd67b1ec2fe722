use std::{env, path::PathBuf, time::Duration};

use crate::storage::dynamodb::DynamoDbConfig;
use crate::storage::sqlite::SqlitePoolConfig;
use crate::storage::StorageBackend;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Storage backend selector (default: unset, meaning SQLite)
    pub db_type: Option<String>,
    /// Path to SQLite database file (default: "devicehub.db")
    pub sqlite_path: String,
    /// Number of pooled SQLite connections (default: 5, minimum 1)
    pub pool_size: usize,
    /// Attempts to replace a dead connection (default: 3)
    pub reconnect_attempts: usize,
    /// Delay between reconnect attempts in milliseconds (default: 200)
    pub reconnect_backoff_ms: u64,
    /// SQLite busy timeout in milliseconds (default: 5,000)
    pub busy_timeout_ms: u64,
    /// DynamoDB table name (default: "devices")
    pub dynamodb_table_name: String,
    /// AWS region (default: "us-east-1")
    pub aws_region: String,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local
    pub aws_endpoint_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DB_TYPE` - `dynamodb` selects DynamoDB, anything else SQLite
    /// - `SQLITE_PATH` - SQLite database path (default: "devicehub.db")
    /// - `DB_POOL_SIZE` - Pooled connections (default: 5)
    /// - `DB_RECONNECT_ATTEMPTS` - Reconnect attempts (default: 3)
    /// - `DB_RECONNECT_BACKOFF_MS` - Reconnect backoff (default: 200)
    /// - `DB_BUSY_TIMEOUT_MS` - SQLite busy timeout (default: 5,000)
    /// - `DYNAMODB_TABLE_NAME` - DynamoDB table (default: "devices")
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ENDPOINT_URL` - Custom DynamoDB endpoint (optional)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_type: lookup("DB_TYPE"),
            sqlite_path: lookup("SQLITE_PATH").unwrap_or_else(|| "devicehub.db".to_string()),
            pool_size: lookup("DB_POOL_SIZE")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(5)
                .max(1),
            reconnect_attempts: lookup("DB_RECONNECT_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            reconnect_backoff_ms: lookup("DB_RECONNECT_BACKOFF_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(200),
            busy_timeout_ms: lookup("DB_BUSY_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
            dynamodb_table_name: lookup("DYNAMODB_TABLE_NAME")
                .unwrap_or_else(|| "devices".to_string()),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.is_empty()),
        }
    }

    /// The storage backend named by `DB_TYPE`.
    pub fn storage_backend(&self) -> StorageBackend {
        StorageBackend::from_setting(self.db_type.as_deref())
    }

    pub fn sqlite_pool_config(&self) -> SqlitePoolConfig {
        SqlitePoolConfig::new(PathBuf::from(&self.sqlite_path))
            .with_pool_size(self.pool_size)
            .with_reconnect(
                self.reconnect_attempts,
                Duration::from_millis(self.reconnect_backoff_ms),
            )
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub fn dynamodb_config(&self) -> DynamoDbConfig {
        DynamoDbConfig {
            table_name: self.dynamodb_table_name.clone(),
            region: self.aws_region.clone(),
            endpoint_url: self.aws_endpoint_url.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.db_type, None);
        assert_eq!(config.sqlite_path, "devicehub.db");
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.reconnect_attempts, 3);
        assert_eq!(config.reconnect_backoff_ms, 200);
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.dynamodb_table_name, "devices");
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.aws_endpoint_url, None);
        assert_eq!(config.storage_backend(), StorageBackend::Sqlite);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DB_TYPE", "DynamoDB"),
            ("SQLITE_PATH", "/tmp/test.db"),
            ("DB_POOL_SIZE", "8"),
            ("DYNAMODB_TABLE_NAME", "devices-test"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
        ]);

        assert_eq!(config.storage_backend(), StorageBackend::DynamoDb);
        assert_eq!(config.sqlite_path, "/tmp/test.db");
        assert_eq!(config.pool_size, 8);

        let dynamodb = config.dynamodb_config();
        assert_eq!(dynamodb.table_name, "devices-test");
        assert_eq!(dynamodb.endpoint_url.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_pool_size_is_clamped() {
        let config = config_from(&[("DB_POOL_SIZE", "0")]);

        assert_eq!(config.pool_size, 1);
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("DB_POOL_SIZE", "many"),
            ("DB_RECONNECT_BACKOFF_MS", "-5"),
        ]);

        assert_eq!(config.pool_size, 5);
        assert_eq!(config.reconnect_backoff_ms, 200);
    }

    #[test]
    fn test_sqlite_pool_config() {
        let config = config_from(&[
            ("DB_RECONNECT_ATTEMPTS", "4"),
            ("DB_RECONNECT_BACKOFF_MS", "50"),
            ("DB_BUSY_TIMEOUT_MS", "100"),
        ]);

        let pool = config.sqlite_pool_config();

        assert_eq!(pool.path, PathBuf::from("devicehub.db"));
        assert_eq!(pool.pool_size, 5);
        assert_eq!(pool.reconnect_attempts, 4);
        assert_eq!(pool.reconnect_backoff, Duration::from_millis(50));
        assert_eq!(pool.busy_timeout, Duration::from_millis(100));
    }

    #[test]
    fn test_empty_endpoint_is_ignored() {
        let config = config_from(&[("AWS_ENDPOINT_URL", "")]);

        assert_eq!(config.aws_endpoint_url, None);
    }
}
