//! Health check handler for service monitoring.
//!
//! Probes database connectivity so orchestrators and load balancers can take
//! the instance out of rotation when the store is unreachable.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::server::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Database connectivity
    pub database: DatabaseStatus,
    /// When the check passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Why the check failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Database reachable
    Healthy,
    /// Database unreachable
    Unhealthy,
}

/// Database connectivity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    /// Round-trip query succeeded
    Connected,
    /// Round-trip query failed
    Disconnected,
}

impl HealthResponse {
    fn healthy(timestamp: DateTime<Utc>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            database: DatabaseStatus::Connected,
            timestamp: Some(timestamp),
            error: None,
        }
    }

    fn unhealthy(error: String) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            database: DatabaseStatus::Disconnected,
            timestamp: None,
            error: Some(error),
        }
    }
}

/// Health check endpoint handler.
///
/// Called frequently by load balancers, so it runs a single trivial query.
#[instrument(name = "health_check", skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Response {
    match state.storage.health_check().await {
        Ok(()) => {
            debug!("Database health check passed");
            (StatusCode::OK, Json(HealthResponse::healthy(Utc::now()))).into_response()
        },
        Err(e) => {
            error!(error = %e, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::unhealthy(e.to_string())))
                .into_response()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_body_shape() {
        let body = serde_json::to_value(HealthResponse::healthy(Utc::now())).unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
        assert!(body["timestamp"].is_string());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn unhealthy_body_shape() {
        let body =
            serde_json::to_value(HealthResponse::unhealthy("pool timed out".into())).unwrap();

        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"], "disconnected");
        assert_eq!(body["error"], "pool timed out");
        assert!(body.get("timestamp").is_none());
    }
}
