//! Relational side of the dual write.
//!
//! A single SQLite-backed table of mirrored records. Every mutation
//! lands here first; the ledger submission follows and is not atomic
//! with it.

mod records;

pub use records::RecordStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Storage-specific result type.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record {0} not found")]
    NotFound(i64),
    #[error("storage connection poisoned")]
    Poisoned,
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operation tag mirrored onto the ledger with every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Operation::Create),
            "UPDATE" => Ok(Operation::Update),
            "DELETE" => Ok(Operation::Delete),
            other => Err(format!("unknown operation tag: {other}")),
        }
    }
}

/// A mirrored relational row.
///
/// `ledger_id` stays `None` until the ledger submission for the row's
/// latest mutation has been acknowledged and written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub field1: String,
    pub field2: String,
    pub ledger_id: Option<String>,
    pub operation: Operation,
    pub created_at: String,
}
