use directory_core::db::{
    create_db, open_db, open_db_in_memory, schema_version, DbError, SchemaGap,
};
use directory_core::{
    ClientData, ClientRepository, Phones, RepoError, SqliteClientRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_directory_tables() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), schema_version());
    assert_table_exists(&conn, "client_info");
    assert_table_exists(&conn, "phones");
    assert_eq!(foreign_keys(&conn), 1);
}

#[test]
fn reopening_file_database_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clients.db");

    let mut conn = open_db(&path).unwrap();
    {
        let mut repo = SqliteClientRepository::try_new(&mut conn).unwrap();
        repo.add_client(&ClientData::new("Anna", "Ivanova", "a@x.com"), &"111".into())
            .unwrap();
    }
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.count_clients().unwrap(), 1);
    assert_eq!(repo.count_phones().unwrap(), 1);
}

#[test]
fn create_db_on_empty_connection_succeeds() {
    let mut conn = Connection::open_in_memory().unwrap();

    create_db(&mut conn).unwrap();
    create_db(&mut conn).unwrap();

    assert_table_exists(&conn, "client_info");
    assert_table_exists(&conn, "phones");
    assert_eq!(user_version(&conn), schema_version());
}

#[test]
fn create_db_wipes_rows_and_restarts_identifiers() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteClientRepository::try_new(&mut conn).unwrap();
        repo.add_client(
            &ClientData::new("Anna", "Ivanova", "a@x.com"),
            &Phones::from(["111", "222"]),
        )
        .unwrap();
        repo.add_client(&ClientData::new("Petr", "Petrov", "p@x.com"), &Phones::Empty)
            .unwrap();
    }

    create_db(&mut conn).unwrap();

    let mut repo = SqliteClientRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.count_clients().unwrap(), 0);
    assert_eq!(repo.count_phones().unwrap(), 0);
    let id = repo
        .add_client(&ClientData::new("Irina", "Sergeeva", "i@x.com"), &Phones::Empty)
        .unwrap();
    assert_eq!(id, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, schema_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_rejects_connection_without_schema() {
    let mut conn = Connection::open_in_memory().unwrap();

    let result = SqliteClientRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("client_info"))
    ));
}

#[test]
fn repository_rejects_phones_table_missing_column() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE client_info (
            client_id INTEGER PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            email TEXT
        );
        CREATE TABLE phones (
            phone_id INTEGER PRIMARY KEY,
            client_id INTEGER NOT NULL
        );",
    )
    .unwrap();

    let result = SqliteClientRepository::try_new(&mut conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "phones",
            column: "phone_number"
        })
    ));
}

#[test]
fn repository_enables_foreign_keys_on_plain_connection() {
    let mut conn = Connection::open_in_memory().unwrap();
    create_db(&mut conn).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();

    SqliteClientRepository::try_new(&mut conn).unwrap();
    assert_eq!(foreign_keys(&conn), 1);
}

#[test]
fn opening_legacy_table_missing_column_leaves_version_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE client_info (
            client_id INTEGER PRIMARY KEY,
            first_name TEXT,
            last_name TEXT
        );",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::IncompatibleSchema(SchemaGap::MissingColumn {
            table: "client_info",
            column: "email"
        })
    ));

    let conn = Connection::open(&path).unwrap();
    assert_eq!(user_version(&conn), 0);
    let phones_created: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'phones');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(phones_created, 0);
}

#[test]
fn repository_rejects_connection_inside_transaction_with_foreign_keys_off() {
    let mut conn = Connection::open_in_memory().unwrap();
    create_db(&mut conn).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF; BEGIN;").unwrap();

    let result = SqliteClientRepository::try_new(&mut conn);
    assert!(matches!(result, Err(RepoError::ForeignKeysDisabled)));
    assert_eq!(foreign_keys(&conn), 0);

    conn.execute_batch("ROLLBACK;").unwrap();
    SqliteClientRepository::try_new(&mut conn).unwrap();
    assert_eq!(foreign_keys(&conn), 1);
}

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn foreign_keys(conn: &Connection) -> i64 {
    conn.query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
