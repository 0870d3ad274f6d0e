//! Process-wide Ed25519 signing keypair.
//!
//! The keypair is derived once at startup, injected into the handlers
//! that need it, and never mutated afterwards.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Ed25519 keypair that signs every record submitted to the ledger.
pub struct NodeKeypair {
    signing_key: SigningKey,
}

impl NodeKeypair {
    /// Derive a keypair deterministically from a seed string.
    ///
    /// The seed is hashed down to 32 bytes, so operators can supply a
    /// mnemonic-style phrase or raw hex without length restrictions.
    pub fn from_seed(seed: &str) -> Self {
        let digest: [u8; 32] = Sha256::digest(seed.as_bytes()).into();
        Self {
            signing_key: SigningKey::from_bytes(&digest),
        }
    }

    /// Generate a keypair from a fresh random seed.
    ///
    /// Returns the seed alongside the keypair so it can be logged and
    /// pinned in configuration for a stable ledger identity.
    pub fn generate() -> (Self, String) {
        let mut raw = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut raw);
        let seed = hex::encode(raw);
        (Self::from_seed(&seed), seed)
    }

    /// Hex-encoded public key, used as the owner identity on records.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message with the node's private key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Public half of the keypair, for signature verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}
