//! Landing page.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, instrument};

use crate::server::AppState;

/// Reports that the service is up, with the database's current time.
#[instrument(name = "index", skip(state))]
pub async fn index(State(state): State<AppState>) -> Response {
    match state.storage.database_time().await {
        Ok(now) => {
            (StatusCode::OK, format!("paylog is running. Database time: {}", now.to_rfc3339()))
                .into_response()
        },
        Err(e) => {
            error!(error = %e, "Failed to read database time");
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable").into_response()
        },
    }
}
