//! API error taxonomy and JSON error envelope.
//!
//! Four failure classes cross the HTTP boundary: validation (400),
//! not-found (404), storage (500), and ledger (500). Enrichment
//! failures never surface here; the lister swallows them per row.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::LedgerError;
use crate::storage::StorageError;

/// Error carried through handlers and rendered as `{"error": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Request payload failed validation; no side effects occurred.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }

    /// Ledger submission failed. The relational write that preceded it
    /// is left standing; see the dual-write note in the handlers.
    pub fn ledger(message: impl Into<String>) -> Self {
        Self::new(500, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// JSON error body, the envelope the UI consumes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => Self::not_found(format!("record {id} not found")),
            other => Self::storage(other.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::ledger(err.to_string())
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
