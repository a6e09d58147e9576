//! Call record ingestion handler.
//!
//! Runs after the allow-list middleware. Checks the body is present, validates
//! it, and upserts the record keyed by transaction hash.

use axum::{extract::State, Json};
use bytes::Bytes;
use paylog_core::validate;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{error::ApiError, server::AppState};

/// Response from successful ingestion.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Always `true`
    pub success: bool,
    /// Transaction hash of the stored record
    pub tx_hash: String,
}

/// Ingests a call record.
///
/// # Errors
///
/// - 400: empty body, malformed JSON, or schema violations
/// - 500: the store failed the write
#[instrument(name = "ingest_call_record", skip(state, body), fields(content_length = body.len()))]
pub async fn ingest_call_record(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    let payload = parse_payload(&body)?;

    let record = validate(&payload).map_err(|errors| {
        let tx_hash = payload.get("tx_hash").and_then(Value::as_str).unwrap_or("unknown");
        warn!(
            tx_hash,
            errors = ?errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Call record failed validation"
        );
        ApiError::InvalidData(errors)
    })?;

    match state.storage.call_records.upsert(&record).await {
        Ok(receipt) => {
            info!(
                tx_hash = %receipt.tx_hash,
                id = receipt.id,
                status = %record.status,
                merged = receipt.created_at != receipt.updated_at,
                "Call record stored"
            );
            Ok(Json(IngestResponse { success: true, tx_hash: receipt.tx_hash }))
        },
        Err(e) => {
            error!(
                error = %e,
                kind = e.kind(),
                tx_hash = %record.tx_hash,
                provider = %record.provider,
                "Failed to persist call record"
            );
            Err(ApiError::Persistence(e))
        },
    }
}

/// Parses the request body, rejecting bodies that carry no data.
fn parse_payload(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::NoData);
    }

    let payload: Value =
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;

    let empty = match &payload {
        Value::Null => true,
        Value::Object(fields) => fields.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ApiError::NoData);
    }

    Ok(payload)
}
