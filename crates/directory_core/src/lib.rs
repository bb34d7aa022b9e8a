//! Core data-access layer for the client directory.
//! Clients and their phone numbers live in SQLite; this crate owns the schema
//! and every statement issued against it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{create_db, open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::client::{Client, ClientData, ClientFilter, ClientId, ClientMatch};
pub use model::phone::{PhoneId, PhoneRecord, Phones};
pub use repo::client_repo::{
    ClientRepository, ConstraintKind, RepoError, RepoResult, SqliteClientRepository,
};
pub use service::directory_service::{DirectoryService, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
