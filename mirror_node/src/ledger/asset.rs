//! Deterministic asset payloads.
//!
//! The asset is the business payload plus the operation tag and
//! timestamp. Its content hash is what ties a relational row to its
//! ledger record: identical inputs must always produce the same digest.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::storage::Operation;

/// Business payload mirrored onto the ledger with every mutation.
///
/// Declaration order of the fields is the canonical serialization
/// order; the content hash is computed over exactly this JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub field1: String,
    pub field2: String,
    pub operation: Operation,
    pub timestamp: String,
}

impl Asset {
    /// Build the asset and its content hash for a mutation.
    pub fn build(
        field1: &str,
        field2: &str,
        operation: Operation,
        timestamp: &str,
    ) -> (Self, String) {
        let asset = Self {
            field1: field1.to_string(),
            field2: field2.to_string(),
            operation,
            timestamp: timestamp.to_string(),
        };
        let hash = asset.content_hash();
        (asset, hash)
    }

    /// Hex SHA-256 digest over the canonical JSON serialization.
    pub fn content_hash(&self) -> String {
        let canonical = serde_json::to_string(self).expect("asset serialization cannot fail");
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }

    /// Ledger-facing data body: the content hash plus the asset fields,
    /// as stored under `asset.data` on the node.
    pub fn to_data(&self, content_hash: &str) -> serde_json::Value {
        json!({
            "data_hash": content_hash,
            "field1": self.field1,
            "field2": self.field2,
            "operation": self.operation,
            "timestamp": self.timestamp,
        })
    }
}
