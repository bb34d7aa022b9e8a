//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the directory data-access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Constraint failures surface as `RepoError::ConstraintViolation` with the
//!   engine's own message; they are never retried.

pub mod client_repo;
