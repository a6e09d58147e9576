//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. Timeout enforcement
//! 4. Body size limit
//! 5. IP allow-list (ingestion route only)
//! 6. Handler execution
//!
//! # Graceful Shutdown
//!
//! On SIGTERM or CTRL+C the server stops accepting connections and waits for
//! in-flight requests before returning.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use paylog_core::{AllowList, Storage};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{handlers, middleware::access::access_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Database access.
    pub storage: Arc<Storage>,
    /// Addresses allowed to submit call records.
    pub allow_list: Arc<AllowList>,
}

impl AppState {
    /// Creates application state from its parts.
    pub fn new(storage: Storage, allow_list: AllowList) -> Self {
        Self { storage: Arc::new(storage), allow_list: Arc::new(allow_list) }
    }
}

/// Router-level limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Maximum time a request may take before a 408 is returned.
    pub request_timeout: Duration,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { request_timeout: Duration::from_secs(30), max_body_bytes: 1024 * 1024 }
    }
}

/// Creates the router with default limits.
///
/// # Example
///
/// ```no_run
/// use paylog_api::{create_router, AppState};
/// use paylog_core::{AllowList, Storage};
/// use sqlx::PgPool;
///
/// async fn start(db: PgPool) {
///     let state = AppState::new(Storage::new(db), AllowList::parse("127.0.0.1"));
///     let app = create_router(state);
///     // Serve the app...
/// }
/// ```
pub fn create_router(state: AppState) -> Router {
    create_router_with_config(state, RouterConfig::default())
}

/// Creates the router with all routes and middleware.
pub fn create_router_with_config(state: AppState, config: RouterConfig) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check));

    let ingest_routes = Router::new()
        .route("/api/data", post(handlers::ingest_call_record))
        .route_layer(middleware::from_fn_with_state(state.clone(), access_middleware));

    Router::new()
        .merge(public_routes)
        .merge(ingest_routes)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(timeout_layer(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Requests still running after `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Middleware to inject request ID into all responses.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-Id", header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// Client socket addresses are attached to every request so the allow-list
/// can fall back to the peer address when no `X-Forwarded-For` is present.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while running.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    config: RouterConfig,
) -> Result<(), std::io::Error> {
    let app = create_router_with_config(state, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn slow_request_times_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(20)));

        let request = axum::http::Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
