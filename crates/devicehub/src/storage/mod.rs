//! Storage backend implementations and runtime selection.
//!
//! Both backends implement `DeviceRepository` from `devicehub_core::storage`.
//! The backend is chosen at startup from the `DB_TYPE` setting:
//!
//! - `dynamodb` (any case): DynamoDB backend using `aws-sdk-dynamodb`
//! - anything else, including unset: pooled SQLite backend using `rusqlite`
//!   and `tokio-rusqlite`

pub mod dynamodb;
pub mod sqlite;

use std::sync::Arc;

use devicehub_core::storage::{DeviceRepository, Result};

use crate::config::Config;

pub use dynamodb::DynamoDbRepository;
pub use sqlite::{SqlitePool, SqliteRepository};

/// Which storage backend serves device requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    DynamoDb,
}

impl StorageBackend {
    /// Interpret a `DB_TYPE` value. Unknown values fall back to SQLite.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("dynamodb") => StorageBackend::DynamoDb,
            None | Some("") => StorageBackend::Sqlite,
            Some(v) if v.eq_ignore_ascii_case("sqlite") => StorageBackend::Sqlite,
            Some(other) => {
                tracing::warn!(db_type = %other, "Unrecognized DB_TYPE, using SQLite");
                StorageBackend::Sqlite
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::DynamoDb => "dynamodb",
        }
    }
}

/// The selected repository, plus the SQLite pool when that backend is active.
#[derive(Clone)]
pub struct Storage {
    pub repository: Arc<dyn DeviceRepository>,
    pub pool: Option<Arc<SqlitePool>>,
}

impl Storage {
    /// Wrap a pooled SQLite repository.
    pub fn sqlite(repository: SqliteRepository) -> Self {
        let pool = Arc::clone(repository.pool());
        Self {
            repository: Arc::new(repository),
            pool: Some(pool),
        }
    }

    /// Wrap a repository that has no connection pool.
    pub fn unpooled(repository: Arc<dyn DeviceRepository>) -> Self {
        Self {
            repository,
            pool: None,
        }
    }
}

/// Build the repository selected by `config`.
///
/// For SQLite this opens every pooled connection and creates the schema, so a
/// bad database path fails startup with `Unavailable`.
pub async fn build_storage(config: &Config) -> Result<Storage> {
    let backend = config.storage_backend();
    tracing::info!(backend = backend.as_str(), "Selecting storage backend");

    match backend {
        StorageBackend::Sqlite => {
            let pool = Arc::new(SqlitePool::new(config.sqlite_pool_config()));
            pool.initialize().await?;
            let repository = SqliteRepository::new(pool);
            repository.init_schema().await?;
            Ok(Storage::sqlite(repository))
        }
        StorageBackend::DynamoDb => {
            let repository = DynamoDbRepository::from_config(&config.dynamodb_config()).await;
            Ok(Storage::unpooled(Arc::new(repository)))
        }
    }
}
