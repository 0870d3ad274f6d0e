//! Cryptographic identity for ledger submissions.

pub mod keys;

pub use keys::NodeKeypair;
