//! HTTP surface of the mirror node.

pub mod errors;
pub mod handlers;
pub mod server;
pub mod validation;
