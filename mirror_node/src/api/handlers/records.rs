//! Mutating endpoints.
//!
//! Each request runs the dual-write pipeline: validate, relational
//! write, asset build, ledger submit, ledger-id write-back. The two
//! writes are not atomic: if the ledger submission fails after the
//! relational write landed, the request returns 500 and the row is
//! left standing without a ledger reference. There is no compensating
//! transaction or retry queue; this gap is a documented limitation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::errors::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::api::validation::validate_record_payload;
use crate::ledger::asset::Asset;
use crate::ledger::transaction::LedgerTransaction;
use crate::storage::Operation;

/// Business payload of the mutating endpoints.
///
/// Fields default to empty so a missing key reaches the validator and
/// comes back as a 400 rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct RecordPayload {
    #[serde(default)]
    pub field1: String,
    #[serde(default)]
    pub field2: String,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub message: String,
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field2: Option<String>,
}

/// Build, sign, and submit the ledger record for one mutation.
async fn mirror_to_ledger(
    state: &AppState,
    field1: &str,
    field2: &str,
    operation: Operation,
) -> ApiResult<String> {
    let timestamp = Utc::now().to_rfc3339();
    let (asset, content_hash) = Asset::build(field1, field2, operation, &timestamp);
    let record = LedgerTransaction::make_create(&asset, &content_hash, &state.keypair.public_key_hex())
        .sign(&state.keypair)
        .map_err(|e| ApiError::ledger(e.to_string()))?;
    Ok(state.ledger.submit_commit(&record).await?)
}

/// `POST /create_transaction`
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult<(StatusCode, Json<MutationResponse>)> {
    validate_record_payload(&payload.field1, &payload.field2)?;

    let created_at = Utc::now().to_rfc3339();
    let row_id = state
        .store
        .insert(&payload.field1, &payload.field2, &created_at)?;

    let ledger_id = mirror_to_ledger(&state, &payload.field1, &payload.field2, Operation::Create).await?;
    state.store.attach_ledger_id(row_id, &ledger_id)?;

    log::info!("created record {row_id}, ledger record {ledger_id}");
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: "record inserted and mirrored to the ledger".to_string(),
            transaction_id: ledger_id,
            id: row_id,
            field1: None,
            field2: None,
        }),
    ))
}

/// `PUT /update_transaction/:id`
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<RecordPayload>,
) -> ApiResult<Json<MutationResponse>> {
    validate_record_payload(&payload.field1, &payload.field2)?;

    // A missing or deleted row aborts here with 404, before any ledger
    // submission.
    state.store.update(id, &payload.field1, &payload.field2)?;

    let ledger_id = mirror_to_ledger(&state, &payload.field1, &payload.field2, Operation::Update).await?;
    state.store.attach_ledger_id(id, &ledger_id)?;

    log::info!("updated record {id}, ledger record {ledger_id}");
    Ok(Json(MutationResponse {
        message: "record updated and mirrored to the ledger".to_string(),
        transaction_id: ledger_id,
        id,
        field1: None,
        field2: None,
    }))
}

/// `DELETE /delete_transaction/:id`
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MutationResponse>> {
    let row = state.store.mark_deleted(id)?;

    let ledger_id = mirror_to_ledger(&state, &row.field1, &row.field2, Operation::Delete).await?;
    state.store.attach_ledger_id(id, &ledger_id)?;

    log::info!("deleted record {id}, ledger record {ledger_id}");
    Ok(Json(MutationResponse {
        message: "record deleted and mirrored to the ledger".to_string(),
        transaction_id: ledger_id,
        id,
        field1: Some(row.field1),
        field2: Some(row.field2),
    }))
}
