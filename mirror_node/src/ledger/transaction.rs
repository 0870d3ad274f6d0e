//! Signed creation records.
//!
//! Every relational mutation becomes one immutable CREATE record on
//! the ledger, regardless of whether the mutation was an insert,
//! update, or delete; the operation tag lives inside the asset data.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::asset::Asset;
use crate::crypto::NodeKeypair;

/// Record format version understood by the ledger node.
pub const RECORD_VERSION: &str = "2.0";

/// One spend input. For creation records there is nothing to fulfil,
/// so `fulfills` stays null and the fulfillment is the owner signature
/// over the unsigned record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub owners_before: Vec<String>,
    pub fulfills: Option<Value>,
    pub fulfillment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionDetails {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputCondition {
    pub details: ConditionDetails,
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub amount: String,
    pub condition: OutputCondition,
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEnvelope {
    pub data: Value,
}

/// A CREATE record as submitted to the ledger node.
///
/// `id` is content-addressed: the hex digest of the fulfilled record,
/// assigned during [`LedgerTransaction::sign`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub id: Option<String>,
    pub operation: String,
    pub version: String,
    pub asset: AssetEnvelope,
    pub metadata: Option<Value>,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
}

impl LedgerTransaction {
    /// Build an unsigned CREATE record wrapping the asset payload,
    /// owned by the given public key.
    pub fn make_create(asset: &Asset, content_hash: &str, public_key: &str) -> Self {
        let condition_uri = format!(
            "ni:///sha-256;{}?fpt=ed25519-sha-256&cost=131072",
            hex::encode(Sha256::digest(public_key.as_bytes()))
        );
        Self {
            id: None,
            operation: "CREATE".to_string(),
            version: RECORD_VERSION.to_string(),
            asset: AssetEnvelope {
                data: asset.to_data(content_hash),
            },
            metadata: None,
            inputs: vec![TransactionInput {
                owners_before: vec![public_key.to_string()],
                fulfills: None,
                fulfillment: None,
            }],
            outputs: vec![TransactionOutput {
                amount: "1".to_string(),
                condition: OutputCondition {
                    details: ConditionDetails {
                        condition_type: "ed25519-sha-256".to_string(),
                        public_key: public_key.to_string(),
                    },
                    uri: condition_uri,
                },
                public_keys: vec![public_key.to_string()],
            }],
        }
    }

    /// Sign the record and assign its content-addressed identifier.
    ///
    /// The signature covers the canonical serialization of the unsigned
    /// record; the id digests the fulfilled record, so any change to
    /// payload or signature changes the id.
    pub fn sign(mut self, keypair: &NodeKeypair) -> anyhow::Result<Self> {
        self.id = None;
        for input in &mut self.inputs {
            input.fulfillment = None;
        }

        let message = serde_json::to_vec(&self)?;
        let signature = keypair.sign(&message);
        let fulfillment = URL_SAFE_NO_PAD.encode(signature.to_bytes());
        for input in &mut self.inputs {
            input.fulfillment = Some(fulfillment.clone());
        }

        let fulfilled = serde_json::to_vec(&self)?;
        self.id = Some(hex::encode(Sha256::digest(&fulfilled)));
        Ok(self)
    }

    /// Bytes the fulfillment signature was computed over.
    pub fn signing_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.id = None;
        for input in &mut unsigned.inputs {
            input.fulfillment = None;
        }
        Ok(serde_json::to_vec(&unsigned)?)
    }
}
