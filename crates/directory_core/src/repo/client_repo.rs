//! Client/phone repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the directory store API over `client_info` and `phones`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every operation is its own committed unit of work; multi-statement
//!   writes share one transaction and leave no rows behind on failure.
//! - Uniqueness, referential integrity and cascades are enforced by SQLite;
//!   the repository performs no input validation of its own.
//! - Update/delete on a missing identifier is a no-op reported as `0`
//!   affected rows, never as an error.

use crate::db::schema::find_schema_gap;
use crate::db::{DbError, SchemaGap};
use crate::model::client::{Client, ClientData, ClientFilter, ClientId, ClientMatch};
use crate::model::phone::{PhoneRecord, Phones};
use rusqlite::ffi;
use rusqlite::{named_params, params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const INSERT_CLIENT_SQL: &str = "INSERT INTO client_info (first_name, last_name, email)
     VALUES (?1, ?2, ?3)
     RETURNING client_id;";

const INSERT_PHONE_SQL: &str = "INSERT INTO phones (client_id, phone_number)
     VALUES (?1, ?2);";

// Client columns and phone columns are filtered independently. The join
// condition `ci.client_id = p.client_id OR ci.client_id IS NULL` is kept as-is:
// `ci.client_id` is never NULL, so it behaves as a plain LEFT JOIN on the
// owner id. Clients without phones survive with a NULL phone_number, unless a
// phone filter is given. Name/email filters never narrow which of a client's
// phones are returned; only the phone filter does, row by row.
const FIND_CLIENTS_SQL: &str = "SELECT
    ci.client_id,
    ci.first_name,
    ci.last_name,
    ci.email,
    p.phone_number
FROM client_info ci
LEFT JOIN phones p ON ci.client_id = p.client_id OR ci.client_id IS NULL
WHERE (ci.first_name = :first_name OR :first_name IS NULL)
  AND (ci.last_name = :last_name OR :last_name IS NULL)
  AND (ci.email = :email OR :email IS NULL)
  AND (p.phone_number = :phone OR :phone IS NULL)
ORDER BY ci.last_name, ci.first_name, ci.client_id, p.phone_id;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Which engine constraint rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Duplicate email or phone number.
    Unique,
    /// Phone references a client that does not exist.
    ForeignKey,
    NotNull,
    /// Column length limit exceeded.
    Check,
    Other,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unique => "unique",
            Self::ForeignKey => "foreign key",
            Self::NotNull => "not null",
            Self::Check => "check",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Repository error for directory persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// A write was rejected by an engine constraint.
    ConstraintViolation {
        kind: ConstraintKind,
        message: String,
    },
    Db(DbError),
    /// Connection is missing a directory table.
    MissingRequiredTable(&'static str),
    /// Directory table is missing an expected column.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// `foreign_keys` could not be enabled, typically because the connection
    /// has an open transaction.
    ForeignKeysDisabled,
    /// Persisted row cannot be converted to the read model.
    InvalidData(String),
}

impl RepoError {
    /// Returns the violated constraint kind, if this is a constraint error.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation { kind, message } => {
                write!(f, "{kind} constraint violation: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "directory repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "directory repository requires column `{column}` in table `{table}`"
            ),
            Self::ForeignKeysDisabled => write!(
                f,
                "directory repository requires `PRAGMA foreign_keys = ON`; it cannot be enabled inside a transaction"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted directory data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConstraintViolation { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::ForeignKeysDisabled => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match classify_constraint(&value) {
            Some(kind) => Self::ConstraintViolation {
                kind,
                message: value.to_string(),
            },
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

fn classify_constraint(err: &rusqlite::Error) -> Option<ConstraintKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != rusqlite::ErrorCode::ConstraintViolation {
        return None;
    }

    let kind = match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
            ConstraintKind::Unique
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
        _ => ConstraintKind::Other,
    };
    Some(kind)
}

/// Repository interface for the client directory.
pub trait ClientRepository {
    /// Inserts one client plus its phones and returns the new client id.
    fn add_client(&mut self, client: &ClientData, phones: &Phones) -> RepoResult<ClientId>;
    /// Inserts phones for an existing client; returns inserted row count.
    fn add_phone(&mut self, client_id: ClientId, phones: &Phones) -> RepoResult<usize>;
    /// Overwrites every client field; returns affected row count.
    fn change_client(&self, client_id: ClientId, client: &ClientData) -> RepoResult<usize>;
    /// Deletes one phone owned by the client; returns affected row count.
    fn delete_phone(&self, client_id: ClientId, phone: &str) -> RepoResult<usize>;
    /// Deletes one client and, by cascade, its phones; returns affected row count.
    fn delete_client(&self, client_id: ClientId) -> RepoResult<usize>;
    /// Searches clients joined with their phones.
    fn find_clients(&self, filter: &ClientFilter) -> RepoResult<Vec<ClientMatch>>;
    /// Loads one client by id.
    fn get_client(&self, client_id: ClientId) -> RepoResult<Option<Client>>;
    /// Lists phones owned by one client in insertion order.
    fn list_phones(&self, client_id: ClientId) -> RepoResult<Vec<PhoneRecord>>;
    fn count_clients(&self) -> RepoResult<u64>;
    fn count_phones(&self) -> RepoResult<u64>;
}

/// SQLite-backed directory repository.
pub struct SqliteClientRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteClientRepository<'conn> {
    /// Constructs a repository from a connection with the directory schema.
    ///
    /// Enables `foreign_keys` on the connection if the caller has not.
    ///
    /// # Errors
    /// - [`RepoError::ForeignKeysDisabled`] when the pragma does not take
    ///   effect, e.g. the caller holds an open transaction with it off.
    /// - [`RepoError::MissingRequiredTable`] / [`RepoError::MissingRequiredColumn`]
    ///   when the schema has not been created.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_directory_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&mut self) -> RepoResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

impl ClientRepository for SqliteClientRepository<'_> {
    fn add_client(&mut self, client: &ClientData, phones: &Phones) -> RepoResult<ClientId> {
        let tx = self.begin()?;
        let client_id: ClientId = tx.query_row(
            INSERT_CLIENT_SQL,
            params![
                client.first_name.as_str(),
                client.last_name.as_str(),
                client.email.as_deref(),
            ],
            |row| row.get(0),
        )?;
        insert_phones(&tx, client_id, phones)?;
        tx.commit()?;

        Ok(client_id)
    }

    fn add_phone(&mut self, client_id: ClientId, phones: &Phones) -> RepoResult<usize> {
        let tx = self.begin()?;
        let inserted = insert_phones(&tx, client_id, phones)?;
        tx.commit()?;

        Ok(inserted)
    }

    fn change_client(&self, client_id: ClientId, client: &ClientData) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE client_info
             SET
                first_name = ?1,
                last_name = ?2,
                email = ?3
             WHERE client_id = ?4;",
            params![
                client.first_name.as_str(),
                client.last_name.as_str(),
                client.email.as_deref(),
                client_id,
            ],
        )?;
        Ok(changed)
    }

    fn delete_phone(&self, client_id: ClientId, phone: &str) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM phones WHERE client_id = ?1 AND phone_number = ?2;",
            params![client_id, phone],
        )?;
        Ok(changed)
    }

    fn delete_client(&self, client_id: ClientId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM client_info WHERE client_id = ?1;",
            [client_id],
        )?;
        Ok(changed)
    }

    fn find_clients(&self, filter: &ClientFilter) -> RepoResult<Vec<ClientMatch>> {
        let mut stmt = self.conn.prepare(FIND_CLIENTS_SQL)?;
        let mut rows = stmt.query(named_params! {
            ":first_name": filter.first_name.as_deref(),
            ":last_name": filter.last_name.as_deref(),
            ":email": filter.email.as_deref(),
            ":phone": filter.phone.as_deref(),
        })?;

        let mut matches = Vec::new();
        while let Some(row) = rows.next()? {
            let client = parse_client_row(row)?;
            matches.push(ClientMatch {
                client_id: client.client_id,
                first_name: client.first_name,
                last_name: client.last_name,
                email: client.email,
                phone_number: row.get("phone_number")?,
            });
        }

        Ok(matches)
    }

    fn get_client(&self, client_id: ClientId) -> RepoResult<Option<Client>> {
        let mut stmt = self.conn.prepare(
            "SELECT client_id, first_name, last_name, email
             FROM client_info
             WHERE client_id = ?1;",
        )?;

        let mut rows = stmt.query([client_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_client_row(row)?));
        }

        Ok(None)
    }

    fn list_phones(&self, client_id: ClientId) -> RepoResult<Vec<PhoneRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT phone_id, client_id, phone_number
             FROM phones
             WHERE client_id = ?1
             ORDER BY phone_id ASC;",
        )?;

        let mut rows = stmt.query([client_id])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(PhoneRecord {
                phone_id: row.get("phone_id")?,
                client_id: row.get("client_id")?,
                phone_number: row.get("phone_number")?,
            });
        }

        Ok(phones)
    }

    fn count_clients(&self) -> RepoResult<u64> {
        count_rows(&*self.conn, "client_info")
    }

    fn count_phones(&self) -> RepoResult<u64> {
        count_rows(&*self.conn, "phones")
    }
}

fn insert_phones(tx: &Transaction<'_>, client_id: ClientId, phones: &Phones) -> RepoResult<usize> {
    if phones.is_empty() {
        return Ok(0);
    }

    let mut stmt = tx.prepare_cached(INSERT_PHONE_SQL)?;
    let mut inserted = 0;
    for number in phones.numbers() {
        inserted += stmt.execute(params![client_id, number])?;
    }
    Ok(inserted)
}

fn parse_client_row(row: &Row<'_>) -> RepoResult<Client> {
    Ok(Client {
        client_id: row.get("client_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
    })
}

fn count_rows(conn: &Connection, table: &str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}

fn ensure_directory_connection_ready(conn: &Connection) -> RepoResult<()> {
    // Cascades and FK checks are per-connection in SQLite. The pragma is a
    // no-op inside an open transaction, so read it back.
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    let enabled: i64 = conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
    if enabled == 0 {
        return Err(RepoError::ForeignKeysDisabled);
    }

    match find_schema_gap(conn)? {
        None => Ok(()),
        Some(SchemaGap::MissingTable(table)) => Err(RepoError::MissingRequiredTable(table)),
        Some(SchemaGap::MissingColumn { table, column }) => {
            Err(RepoError::MissingRequiredColumn { table, column })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConstraintKind, RepoError};
    use rusqlite::Connection;

    #[test]
    fn unique_violation_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();

        let err = conn.execute("INSERT INTO t VALUES ('a');", []).unwrap_err();
        let repo_err = RepoError::from(err);
        assert_eq!(repo_err.constraint_kind(), Some(ConstraintKind::Unique));
    }

    #[test]
    fn non_constraint_errors_stay_db_errors() {
        let conn = Connection::open_in_memory().unwrap();

        let err = conn.execute("SELECT * FROM missing_table;", []).unwrap_err();
        let repo_err = RepoError::from(err);
        assert!(matches!(repo_err, RepoError::Db(_)));
        assert_eq!(repo_err.constraint_kind(), None);
    }
}
