//! Directory schema definition and lifecycle.
//!
//! # Responsibility
//! - Own the DDL for `client_info` and `phones`.
//! - Provide a non-destructive `ensure_schema` and a destructive `create_db`.
//!
//! # Invariants
//! - Both entry points run inside a single transaction.
//! - `user_version` is only written once every required column is present.
//! - Applied schema version is mirrored to `PRAGMA user_version`.
//! - Column length limits are engine-enforced `CHECK` constraints, since SQLite
//!   ignores `VARCHAR(n)` widths.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use std::fmt::{Display, Formatter};

const SCHEMA_VERSION: u32 = 1;

const CREATE_TABLES_SQL: &str = "
CREATE TABLE IF NOT EXISTS client_info (
    client_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name VARCHAR(40) CHECK (length(first_name) <= 40),
    last_name VARCHAR(40) CHECK (length(last_name) <= 40),
    email VARCHAR(40) UNIQUE CHECK (length(email) <= 40)
);

CREATE TABLE IF NOT EXISTS phones (
    phone_id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL,
    phone_number VARCHAR(12) UNIQUE NOT NULL CHECK (length(phone_number) <= 12),
    FOREIGN KEY (client_id) REFERENCES client_info (client_id)
        ON DELETE CASCADE
);
";

const CREATE_INDEXES_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_phones_client_id ON phones (client_id);
";

/// Columns the directory reads and writes, per table.
pub(crate) const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "client_info",
        &["client_id", "first_name", "last_name", "email"],
    ),
    ("phones", &["phone_id", "client_id", "phone_number"]),
];

/// First missing piece of the directory schema found on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaGap {
    MissingTable(&'static str),
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for SchemaGap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

// phones first: SQLite has no DROP ... CASCADE.
const DROP_TABLES_SQL: &str = "
DROP TABLE IF EXISTS phones;
DROP TABLE IF EXISTS client_info;
";

/// Returns the schema version written by this build.
pub fn schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Creates any missing directory tables without touching existing rows.
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the database was written by a
///   newer build.
/// - [`DbError::IncompatibleSchema`] when a pre-existing table lacks a required
///   column. Nothing is written in that case, `user_version` included.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    if current_version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(CREATE_TABLES_SQL)?;
    if let Some(gap) = find_schema_gap(&tx)? {
        return Err(DbError::IncompatibleSchema(gap));
    }
    tx.execute_batch(CREATE_INDEXES_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    Ok(())
}

/// Drops and recreates the directory tables.
///
/// Destructive: every client and phone row is removed and identifiers start
/// over. Drops are conditional, so this also works on an empty database.
pub fn create_db(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(DROP_TABLES_SQL)?;
    tx.execute_batch(CREATE_TABLES_SQL)?;
    tx.execute_batch(CREATE_INDEXES_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;

    info!("event=schema_reset module=db status=ok version={SCHEMA_VERSION}");
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Returns the first required table or column missing on `conn`, if any.
pub(crate) fn find_schema_gap(conn: &Connection) -> rusqlite::Result<Option<SchemaGap>> {
    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Ok(Some(SchemaGap::MissingTable(table)));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Ok(Some(SchemaGap::MissingColumn { table, column }));
            }
        }
    }
    Ok(None)
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
