//! SQLite schema definitions and SQL query constants.
//!
//! This module contains all SQL statements used by the SQLite repository,
//! following the Functional Core pattern - pure data, no I/O.

/// Per-connection settings applied right after a connection is opened.
///
/// The encoding only takes effect when the database file is first created.
pub const CONNECTION_PRAGMAS: &str = r#"
PRAGMA encoding = 'UTF-8';
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
"#;

/// SQL statement to create the devices table.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS devices (
    id TEXT PRIMARY KEY NOT NULL CHECK (length(id) <= 36),
    name TEXT NOT NULL,
    manufacturer TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_devices_name ON devices(name);
CREATE INDEX IF NOT EXISTS idx_devices_manufacturer ON devices(manufacturer);
"#;

/// Liveness check run before a pooled connection is handed out.
pub const PING: &str = "SELECT 1";

pub const INSERT_DEVICE: &str = r#"
INSERT INTO devices (id, name, manufacturer, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
RETURNING id, name, manufacturer, created_at, updated_at
"#;

pub const SELECT_DEVICE_BY_ID: &str = r#"
SELECT id, name, manufacturer, created_at, updated_at
FROM devices
WHERE id = ?1
"#;

pub const SELECT_ALL_DEVICES: &str = r#"
SELECT id, name, manufacturer, created_at, updated_at
FROM devices
ORDER BY created_at, id
"#;

/// Absent fields are passed as NULL and keep their stored value.
///
/// `updated_at` is clamped to `created_at`. Timestamps are fixed-width
/// RFC 3339 text, so `MAX` compares them in time order.
pub const UPDATE_DEVICE: &str = r#"
UPDATE devices
SET name = COALESCE(?2, name),
    manufacturer = COALESCE(?3, manufacturer),
    updated_at = MAX(?4, created_at)
WHERE id = ?1
RETURNING id, name, manufacturer, created_at, updated_at
"#;

pub const DELETE_DEVICE: &str = r#"
DELETE FROM devices WHERE id = ?1
"#;
