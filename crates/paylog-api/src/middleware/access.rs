//! IP allow-list middleware.
//!
//! Resolves the client address from `X-Forwarded-For` (first entry) or the
//! connection peer, then checks it against the configured allow-list before
//! the ingestion handler runs.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use paylog_core::AccessDecision;
use tracing::{debug, error, warn};

use crate::{error::ApiError, server::AppState};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Extracts the first `X-Forwarded-For` entry, trimmed.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Resolves the address the allow-list is checked against.
fn client_address(req: &Request<Body>) -> Option<String> {
    forwarded_for(req.headers()).or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

/// Axum middleware that rejects clients outside the allow-list.
pub async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let candidate = client_address(&req);

    match state.allow_list.check(candidate.as_deref()) {
        AccessDecision::Allow => {
            debug!(client_addr = candidate.as_deref().unwrap_or_default(), "Client authorized");
            Ok(next.run(req).await)
        },
        AccessDecision::Deny => {
            warn!(
                client_addr = candidate.as_deref().unwrap_or("unknown"),
                allow_list = ?state.allow_list.iter().collect::<Vec<_>>(),
                "Rejected request from unauthorized address"
            );
            Err(ApiError::Forbidden)
        },
        AccessDecision::Misconfigured => {
            error!(
                client_addr = candidate.as_deref().unwrap_or("unknown"),
                "IP allow-list is empty; set ALLOWED_IPS to accept call records"
            );
            Err(ApiError::Misconfigured)
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn forwarded_for_takes_first_trimmed_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));

        assert_eq!(forwarded_for(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn blank_forwarded_for_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_static(" ,10.0.0.1"));

        assert_eq!(forwarded_for(&headers), None);
    }

    #[test]
    fn falls_back_to_peer_address() {
        let peer: SocketAddr = "192.0.2.10:55000".parse().unwrap();
        let mut req = Request::builder().uri("/api/data").body(Body::empty()).unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));

        assert_eq!(client_address(&req), Some("192.0.2.10".to_string()));
    }

    #[test]
    fn header_wins_over_peer_address() {
        let peer: SocketAddr = "192.0.2.10:55000".parse().unwrap();
        let mut req = Request::builder()
            .uri("/api/data")
            .header(FORWARDED_FOR, "198.51.100.4")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));

        assert_eq!(client_address(&req), Some("198.51.100.4".to_string()));
    }

    #[test]
    fn no_header_and_no_peer_yields_none() {
        let req = Request::builder().uri("/api/data").body(Body::empty()).unwrap();

        assert_eq!(client_address(&req), None);
    }
}
