//! Domain model for the client directory.
//!
//! # Responsibility
//! - Define the client and phone records shared by repository and service.
//! - Describe search filters and search result rows.
//!
//! # Invariants
//! - Identifiers are engine-assigned and never chosen by callers.
//! - A phone always belongs to exactly one client.

pub mod client;
pub mod phone;
