//! Bounded pool of SQLite connections.
//!
//! The pool is built once at startup and shared through an `Arc`. It opens
//! its connections lazily on first use, bounds concurrent checkouts with a
//! semaphore, and checks every connection before handing it out. A connection
//! that fails the check is replaced with a fresh one, retried with a fixed
//! backoff a bounded number of times.
//!
//! `acquire` waits without a timeout when every connection is checked out.
//! Callers that need a deadline wrap it in `tokio::time::timeout`.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tokio_rusqlite::Connection;

use devicehub_core::storage::{RepositoryError, Result};

use super::error::{map_tokio_rusqlite_error, wrap_err};
use super::schema;

pub const DEFAULT_POOL_SIZE: usize = 5;
pub const DEFAULT_RECONNECT_ATTEMPTS: usize = 3;
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_millis(200);
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

// ============================================================================
// Configuration
// ============================================================================

/// Settings for a [`SqlitePool`].
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Database file, created on first open.
    pub path: PathBuf,
    /// Number of connections, at least 1.
    pub pool_size: usize,
    /// Attempts to open a replacement for a dead connection.
    pub reconnect_attempts: usize,
    /// Fixed delay between reconnect attempts.
    pub reconnect_backoff: Duration,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl SqlitePoolConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: DEFAULT_POOL_SIZE,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Sets the pool size. Zero is clamped to one.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_reconnect(mut self, attempts: usize, backoff: Duration) -> Self {
        self.reconnect_attempts = attempts;
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }
}

/// Point-in-time view of the pool, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub size: usize,
    pub idle: usize,
    pub available: usize,
    pub initialized: bool,
}

// ============================================================================
// Pool
// ============================================================================

struct PoolInner {
    idle: Mutex<Vec<Connection>>,
    permits: Arc<Semaphore>,
    closed: AtomicBool,
}

impl PoolInner {
    fn idle(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded, lazily initialized pool of SQLite connections.
pub struct SqlitePool {
    config: SqlitePoolConfig,
    state: RwLock<Option<Arc<PoolInner>>>,
}

impl SqlitePool {
    /// Creates an uninitialized pool. No connection is opened until the
    /// first `initialize` or `acquire`.
    pub fn new(config: SqlitePoolConfig) -> Self {
        let config = SqlitePoolConfig {
            pool_size: config.pool_size.max(1),
            ..config
        };
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    /// Opens every connection of the pool. Calling it again after a
    /// successful initialization is a no-op.
    ///
    /// Failure is returned as `Unavailable` and leaves the pool uninitialized.
    pub async fn initialize(&self) -> Result<()> {
        self.inner().await.map(|_| ())
    }

    async fn inner(&self) -> Result<Arc<PoolInner>> {
        if let Some(inner) = self.state.read().await.as_ref() {
            return Ok(Arc::clone(inner));
        }

        let mut state = self.state.write().await;
        // Another task may have initialized while we waited for the lock.
        if let Some(inner) = state.as_ref() {
            return Ok(Arc::clone(inner));
        }

        let mut connections = Vec::with_capacity(self.config.pool_size);
        for _ in 0..self.config.pool_size {
            let conn = open_connection(&self.config).await.map_err(|e| {
                tracing::error!(
                    path = %self.config.path.display(),
                    error = %e,
                    "Failed to initialize connection pool"
                );
                RepositoryError::Unavailable(format!(
                    "Failed to initialize connection pool: {e}"
                ))
            })?;
            connections.push(conn);
        }

        let inner = Arc::new(PoolInner {
            idle: Mutex::new(connections),
            permits: Arc::new(Semaphore::new(self.config.pool_size)),
            closed: AtomicBool::new(false),
        });
        *state = Some(Arc::clone(&inner));

        tracing::info!(
            path = %self.config.path.display(),
            pool_size = self.config.pool_size,
            "Connection pool initialized"
        );

        Ok(inner)
    }

    /// Checks out a live connection, initializing the pool if needed.
    ///
    /// Waits while every connection is checked out. A connection that fails
    /// the liveness check is replaced; if no replacement can be opened after
    /// the configured attempts the error is `Unavailable`.
    pub async fn acquire(&self) -> Result<PooledConnection> {
        let inner = self.inner().await?;

        let permit = Arc::clone(&inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| RepositoryError::Unavailable("Connection pool is shut down".to_string()))?;

        let candidate = inner.idle().pop();
        let conn = match candidate {
            Some(conn) => match ping(&conn).await {
                Ok(()) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "Pooled connection failed liveness check, reconnecting");
                    self.reconnect().await?
                }
            },
            None => self.reconnect().await?,
        };

        Ok(PooledConnection {
            conn,
            pool: inner,
            _permit: permit,
        })
    }

    /// Acquires a connection, runs `function` on it and releases it.
    pub async fn run<F, R>(&self, function: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.acquire().await?;
        let result = conn
            .call(move |conn| function(conn).map_err(wrap_err))
            .await
            .map_err(map_tokio_rusqlite_error);
        conn.release();
        result
    }

    /// Opens a replacement connection, retrying with a fixed backoff.
    async fn reconnect(&self) -> Result<Connection> {
        let attempts = self.config.reconnect_attempts.max(1);
        let strategy = FixedInterval::new(self.config.reconnect_backoff).take(attempts - 1);

        let mut attempt = 0usize;
        Retry::start(strategy, || {
            attempt += 1;
            let current = attempt;
            let config = self.config.clone();
            async move {
                let result = async {
                    let conn = open_connection(&config).await?;
                    ping(&conn).await?;
                    Ok::<_, tokio_rusqlite::Error>(conn)
                }
                .await;
                if let Err(e) = &result {
                    tracing::warn!(
                        attempt = current,
                        max_attempts = attempts,
                        error = %e,
                        "Reconnect attempt failed"
                    );
                }
                result
            }
        })
        .await
        .map_err(|e| {
            tracing::error!(attempts, error = %e, "Could not reconnect to database");
            RepositoryError::Unavailable(format!(
                "Could not reconnect after {attempts} attempts: {e}"
            ))
        })
    }

    /// Closes every idle connection and resets the pool, so the next
    /// `acquire` initializes it again.
    ///
    /// Connections still checked out are closed when their guard drops.
    /// Tasks waiting in `acquire` fail with `Unavailable`.
    pub async fn shutdown(&self) {
        let Some(inner) = self.state.write().await.take() else {
            return;
        };

        inner.closed.store(true, Ordering::SeqCst);
        inner.permits.close();

        let connections = std::mem::take(&mut *inner.idle());
        let count = connections.len();
        for conn in connections {
            if let Err(e) = conn.close().await {
                tracing::warn!(error = %e, "Failed to close pooled connection");
            }
        }

        tracing::info!(closed = count, "Connection pool closed");
    }

    pub async fn stats(&self) -> PoolStats {
        match self.state.read().await.as_ref() {
            Some(inner) => PoolStats {
                size: self.config.pool_size,
                idle: inner.idle().len(),
                available: inner.permits.available_permits(),
                initialized: true,
            },
            None => PoolStats {
                size: self.config.pool_size,
                idle: 0,
                available: 0,
                initialized: false,
            },
        }
    }
}

// ============================================================================
// Checked-out connection
// ============================================================================

/// A connection checked out of a [`SqlitePool`].
///
/// Dropping the guard returns the connection to the pool, so it is released
/// on every exit path including errors and cancelled futures.
pub struct PooledConnection {
    conn: Connection,
    pool: Arc<PoolInner>,
    // Declared last so the connection is back in the pool before the permit
    // wakes the next waiter.
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    /// Returns the connection to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        // Once the pool is shut down the handle is discarded, which stops its
        // background thread when the last clone goes away.
        if !self.pool.closed.load(Ordering::SeqCst) {
            self.pool.idle().push(self.conn.clone());
        }
    }
}

// ============================================================================
// Connection helpers
// ============================================================================

async fn open_connection(config: &SqlitePoolConfig) -> tokio_rusqlite::Result<Connection> {
    let conn = Connection::open(config.path.clone()).await?;
    let busy_timeout = config.busy_timeout;
    conn.call(move |conn| {
        conn.busy_timeout(busy_timeout).map_err(wrap_err)?;
        conn.execute_batch(schema::CONNECTION_PRAGMAS)
            .map_err(wrap_err)?;
        Ok(())
    })
    .await?;
    Ok(conn)
}

async fn ping(conn: &Connection) -> tokio_rusqlite::Result<()> {
    conn.call(|conn| {
        conn.query_row(schema::PING, [], |row| row.get::<_, i64>(0))
            .map_err(wrap_err)?;
        Ok(())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir, pool_size: usize) -> SqlitePoolConfig {
        SqlitePoolConfig::new(dir.path().join("devices.db"))
            .with_pool_size(pool_size)
            .with_reconnect(2, Duration::from_millis(1))
    }

    #[test]
    fn test_pool_size_is_clamped_to_one() {
        let config = SqlitePoolConfig::new("devices.db").with_pool_size(0);
        assert_eq!(config.pool_size, 1);
    }

    #[tokio::test]
    async fn test_pool_is_lazy() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 2));

        assert!(!pool.stats().await.initialized);
        assert!(!dir.path().join("devices.db").exists());

        pool.acquire().await.unwrap().release();

        let stats = pool.stats().await;
        assert!(stats.initialized);
        assert_eq!(stats.size, 2);
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.available, 2);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 3));

        pool.initialize().await.unwrap();
        pool.initialize().await.unwrap();

        let stats = pool.stats().await;
        assert_eq!(stats.idle, 3);
        assert_eq!(stats.available, 3);
    }

    #[tokio::test]
    async fn test_initialize_failure_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = SqlitePoolConfig::new(dir.path().join("missing").join("devices.db"));
        let pool = SqlitePool::new(config);

        let result = pool.initialize().await;

        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));
        assert!(!pool.stats().await.initialized);
    }

    #[tokio::test]
    async fn test_acquire_tracks_checked_out_connections() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 2));

        let first = pool.acquire().await.unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.available, 1);

        first.release();
        let stats = pool.stats().await;
        assert_eq!(stats.idle, 2);
        assert_eq!(stats.available, 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_when_exhausted() {
        let dir = TempDir::new().unwrap();
        let pool = Arc::new(SqlitePool::new(test_config(&dir, 1)));

        let held = pool.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), pool.acquire()).await;
        assert!(blocked.is_err(), "acquire should wait while the pool is exhausted");

        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await.map(PooledConnection::release) })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        held.release();

        let resumed = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter should resume after release")
            .unwrap();
        assert!(resumed.is_ok());
    }

    #[tokio::test]
    async fn test_dead_connection_is_replaced() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 1));

        let conn = pool.acquire().await.unwrap();
        let handle: Connection = (*conn).clone();
        handle.close().await.unwrap();
        conn.release();

        let value = pool
            .run(|conn| conn.query_row("SELECT 41 + 1", [], |row| row.get::<_, i64>(0)))
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(pool.stats().await.idle, 1);
    }

    #[tokio::test]
    async fn test_reconnect_exhaustion_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        let config = SqlitePoolConfig::new(data_dir.join("devices.db"))
            .with_pool_size(1)
            .with_reconnect(2, Duration::from_millis(1));
        let pool = SqlitePool::new(config);

        let conn = pool.acquire().await.unwrap();
        let handle: Connection = (*conn).clone();
        handle.close().await.unwrap();
        conn.release();

        std::fs::remove_dir_all(&data_dir).unwrap();

        let result = pool.acquire().await;
        assert!(matches!(result, Err(RepositoryError::Unavailable(_))));

        // The permit is returned even though the acquire failed.
        assert_eq!(pool.stats().await.available, 1);
    }

    #[tokio::test]
    async fn test_run_maps_sql_errors() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 1));

        let result = pool
            .run(|conn| conn.execute("INSERT INTO no_such_table VALUES (1)", []))
            .await;

        assert!(matches!(result, Err(RepositoryError::QueryFailed(_))));
        assert_eq!(pool.stats().await.available, 1);
    }

    #[tokio::test]
    async fn test_shutdown_then_acquire_reinitializes() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 2));

        pool.initialize().await.unwrap();
        pool.shutdown().await;

        let stats = pool.stats().await;
        assert!(!stats.initialized);
        assert_eq!(stats.idle, 0);

        pool.acquire().await.unwrap().release();
        let stats = pool.stats().await;
        assert!(stats.initialized);
        assert_eq!(stats.idle, 2);
    }

    #[tokio::test]
    async fn test_connection_checked_out_at_shutdown_is_discarded() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 1));

        let conn = pool.acquire().await.unwrap();
        pool.shutdown().await;
        conn.release();

        pool.initialize().await.unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.idle, 1);
        assert_eq!(stats.available, 1);
    }

    #[tokio::test]
    async fn test_shutdown_of_uninitialized_pool_is_noop() {
        let dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(test_config(&dir, 1));

        pool.shutdown().await;

        assert!(!pool.stats().await.initialized);
    }
}
