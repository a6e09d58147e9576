//! Request and response helpers for driving the router with `oneshot`.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// Builds a `POST /api/data` request, optionally spoofing the client address
/// through `X-Forwarded-For`.
pub fn ingest_request(body: impl Into<Body>, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder =
        Request::builder().method("POST").uri("/api/data").header(CONTENT_TYPE, "application/json");
    if let Some(addr) = forwarded_for {
        builder = builder.header("x-forwarded-for", addr);
    }
    #[allow(clippy::expect_used)]
    builder.body(body.into()).expect("static request parts are valid")
}

/// Builds a `GET` request for `uri`.
pub fn get_request(uri: &str) -> Request<Body> {
    #[allow(clippy::expect_used)]
    Request::builder().method("GET").uri(uri).body(Body::empty()).expect("valid GET request")
}

/// Sends a JSON payload to the ingestion endpoint from `forwarded_for`.
pub async fn post_json(
    app: Router,
    payload: &Value,
    forwarded_for: Option<&str>,
) -> Response<Body> {
    let request = ingest_request(payload.to_string(), forwarded_for);
    match app.oneshot(request).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    }
}

/// Sends a `GET` request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    match app.oneshot(get_request(uri)).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    }
}

/// Reads the response body as text.
pub async fn read_text(response: Response<Body>) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Reads the response body as JSON.
pub async fn read_json(response: Response<Body>) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
