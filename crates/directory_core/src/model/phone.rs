//! Phone domain model.
//!
//! # Responsibility
//! - Define the persisted phone record.
//! - Define [`Phones`], the explicit "none, one or many" phone argument.
//!
//! # Invariants
//! - `phone_number` is unique across all phones.
//! - `Phones::Many` preserves caller order; rows are inserted in that order.

use crate::model::client::ClientId;
use serde::{Deserialize, Serialize};

/// Engine-assigned phone identifier.
pub type PhoneId = i64;

/// Persisted phone record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
    pub phone_id: PhoneId,
    pub client_id: ClientId,
    pub phone_number: String,
}

/// Phone numbers attached to a write operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phones {
    /// No phone rows.
    #[default]
    Empty,
    /// Exactly one phone row.
    Single(String),
    /// One phone row per value, in order. An empty list inserts nothing.
    Many(Vec<String>),
}

impl Phones {
    /// Iterates phone numbers in insertion order.
    pub fn numbers(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            Self::Empty => &[],
            Self::Single(number) => std::slice::from_ref(number),
            Self::Many(numbers) => numbers.as_slice(),
        };
        slice.iter().map(String::as_str)
    }

    /// Number of phone rows this value produces.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(numbers) => numbers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Phones {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for Phones {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for Phones {
    fn from(value: Vec<String>) -> Self {
        Self::Many(value)
    }
}

impl From<&[&str]> for Phones {
    fn from(value: &[&str]) -> Self {
        Self::Many(value.iter().map(|number| number.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Phones {
    fn from(value: [&str; N]) -> Self {
        Self::from(value.as_slice())
    }
}

impl<T: Into<Phones>> From<Option<T>> for Phones {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}
