//! HTTP-facing error taxonomy.
//!
//! Client errors carry structured detail. Server-side failures return a
//! fixed, generic body; the underlying cause is logged where it happens.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use paylog_core::{CoreError, FieldError};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body was empty or carried no fields.
    #[error("no data provided")]
    NoData,

    /// Request body was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Payload failed schema validation.
    #[error("invalid data format: {} field error(s)", .0.len())]
    InvalidData(Vec<FieldError>),

    /// Client address is not allow-listed.
    #[error("client address not authorized")]
    Forbidden,

    /// The allow-list is empty, so no client can be authorized.
    #[error("IP allow-list is not configured")]
    Misconfigured,

    /// The store rejected or failed the write.
    #[error("persistence failed: {0}")]
    Persistence(#[from] CoreError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short error title.
    pub error: &'static str,
    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field-level validation errors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ApiError {
    /// HTTP status code for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoData | Self::InvalidJson(_) | Self::InvalidData(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Misconfigured | Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            Self::NoData => ErrorResponse {
                error: "No data provided",
                message: Some("Request body must be a non-empty JSON object".to_string()),
                details: Vec::new(),
            },
            Self::InvalidJson(reason) => ErrorResponse {
                error: "Invalid JSON",
                message: Some(reason.clone()),
                details: Vec::new(),
            },
            Self::InvalidData(errors) => ErrorResponse {
                error: "Invalid data format",
                message: None,
                details: errors.iter().map(ToString::to_string).collect(),
            },
            Self::Forbidden => ErrorResponse {
                error: "Forbidden",
                message: Some("IP address not authorized".to_string()),
                details: Vec::new(),
            },
            Self::Misconfigured => ErrorResponse {
                error: "Server misconfiguration",
                message: Some("IP allow-list is not configured".to_string()),
                details: Vec::new(),
            },
            Self::Persistence(_) => ErrorResponse {
                error: "Internal server error",
                message: Some("Database persistence failed".to_string()),
                details: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::NoData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidData(Vec::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::Misconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::Persistence(CoreError::Database("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn persistence_body_hides_cause() {
        let error = ApiError::Persistence(CoreError::ConstraintViolation(
            "check constraint violation: call_records_status_check".into(),
        ));

        let body = serde_json::to_value(error.body()).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "error": "Internal server error",
                "message": "Database persistence failed"
            })
        );
    }

    #[test]
    fn invalid_data_lists_field_errors() {
        let errors = paylog_core::validate(&serde_json::json!({ "tx_hash": 1 })).unwrap_err();
        let body = serde_json::to_value(ApiError::InvalidData(errors).body()).unwrap();

        assert_eq!(body["error"], "Invalid data format");
        assert_eq!(body["details"][0], "tx_hash must be a string");
        assert!(body.get("message").is_none());
    }
}
