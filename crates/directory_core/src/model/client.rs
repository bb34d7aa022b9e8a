//! Client domain model.
//!
//! # Responsibility
//! - Define the persisted client record and its write payload.
//! - Define search filters and the joined client/phone result row.
//!
//! # Invariants
//! - `client_id` is assigned by the engine and is monotonic.
//! - `email` is unique across clients when present.

use serde::{Deserialize, Serialize};

/// Engine-assigned client identifier.
pub type ClientId = i64;

/// Persisted client record.
///
/// Name columns are nullable in the schema; rows written by other callers may
/// carry `None` there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Unique across clients. `None` only when the caller omitted it.
    pub email: Option<String>,
}

/// Write payload for creating or fully overwriting a client.
///
/// Updates replace every field; there is no partial update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl ClientData {
    /// Builds a payload with an email address.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: Some(email.into()),
        }
    }

    /// Builds a payload without an email address.
    pub fn without_email(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
        }
    }
}

/// Search filter; every `None` field matches unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFilter {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientFilter {
    /// Filter that matches every client.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn last_name(mut self, value: impl Into<String>) -> Self {
        self.last_name = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone(mut self, value: impl Into<String>) -> Self {
        self.phone = Some(value.into());
        self
    }
}

/// One search result row: a client joined with at most one of its phones.
///
/// A client with several phones yields one row per phone; a client without
/// phones yields one row with `phone_number = None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMatch {
    pub client_id: ClientId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}
