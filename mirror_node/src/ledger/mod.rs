//! Ledger node driver.
//!
//! Everything the middleware needs to talk to the external ledger
//! node: deterministic asset payloads, signed creation records, and
//! the HTTP client used to submit and query them.

pub mod asset;
pub mod client;
pub mod transaction;

pub use asset::Asset;
pub use client::{LedgerClient, LedgerError};
pub use transaction::LedgerTransaction;
