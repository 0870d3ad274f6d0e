//! ChainMirror node library.
//!
//! Mirrors CRUD operations on a relational table into immutable,
//! signed records on an external ledger node, and serves a read
//! endpoint that joins both stores for display.

pub mod api;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod storage;
