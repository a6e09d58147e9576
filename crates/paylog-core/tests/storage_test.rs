//! Storage integration tests.
//!
//! Exercise the upsert against a real PostgreSQL database: first insert,
//! conflict merge on `tx_hash`, transactional writes and the store-side
//! timestamp parsing.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use paylog_core::{validate, CallStatus, CoreError, ErrorCategory, NewCallRecord};
use paylog_testing::{CallRecordBuilder, TestEnv};

fn record(builder: CallRecordBuilder) -> NewCallRecord {
    validate(&builder.build()).expect("fixture should validate")
}

#[tokio::test]
async fn upsert_inserts_new_record() {
    let env = TestEnv::new().await.expect("test env setup");
    let storage = env.storage();

    let receipt = storage
        .call_records
        .upsert(&record(CallRecordBuilder::new("0xinsert")))
        .await
        .expect("upsert should succeed");

    assert_eq!(receipt.tx_hash, "0xinsert");
    assert_eq!(receipt.created_at, receipt.updated_at);

    let stored = env.record("0xinsert").await.expect("query").expect("record stored");
    assert_eq!(stored.id, receipt.id);
    assert_eq!(stored.provider, "weather-api");
    assert_eq!(stored.status, CallStatus::Success);
    assert_eq!(stored.price_usdc, BigDecimal::from_str("0.25").expect("decimal"));
    assert_eq!(stored.total_duration_ms, Some(1500));
    assert!(stored.completed_at.is_some());
    assert_eq!(stored.error_type, None);
    assert!(stored.payment_validated);

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn conflicting_upsert_updates_mutable_columns_only() {
    let env = TestEnv::new().await.expect("test env setup");
    let repo = env.storage().call_records;

    let first = repo
        .upsert(&record(CallRecordBuilder::new("0xmerge")))
        .await
        .expect("first upsert");

    let retry = CallRecordBuilder::new("0xmerge")
        .failed("AllRetriesFailed", "upstream returned 502")
        .field("provider", "other-provider")
        .field("provider_node", "other-node")
        .field("source_node", "other-source")
        .field("arg_count", 9)
        .field("price_usdc", "9.99")
        .field("started_at", "2030-01-01T00:00:00Z")
        .field("transferred_usdc", "0")
        .field("payment_validated", false)
        .field("validation_error", "amount mismatch");

    let second = repo.upsert(&record(retry)).await.expect("second upsert");

    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(env.record_count().await.expect("count"), 1);

    let stored = env.record("0xmerge").await.expect("query").expect("record stored");

    // Kept from the first write
    assert_eq!(stored.arg_count, 2);
    assert_eq!(stored.price_usdc, BigDecimal::from_str("0.25").expect("decimal"));
    assert_eq!(stored.transferred_usdc, BigDecimal::from_str("0.25").expect("decimal"));
    assert_eq!(stored.started_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");

    // Overwritten, including with NULL
    assert_eq!(stored.provider, "other-provider");
    assert_eq!(stored.provider_node, "other-node");
    assert_eq!(stored.source_node, "other-source");
    assert_eq!(stored.status, CallStatus::Failed);
    assert_eq!(stored.error_type, Some(ErrorCategory::AllRetriesFailed));
    assert_eq!(stored.error_message.as_deref(), Some("upstream returned 502"));
    assert_eq!(stored.validation_error.as_deref(), Some("amount mismatch"));
    assert_eq!(stored.successful_attempt, 0);
    assert_eq!(stored.total_attempts, 3);
    assert_eq!(stored.completed_at, None);
    assert_eq!(stored.response_size_bytes, None);
    assert!(!stored.payment_validated);

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn upsert_in_rolled_back_transaction_leaves_no_row() {
    let env = TestEnv::new().await.expect("test env setup");
    let repo = env.storage().call_records;

    let mut tx = env.pool().begin().await.expect("begin transaction");
    repo.upsert_in_tx(&mut tx, &record(CallRecordBuilder::new("0xtx")))
        .await
        .expect("upsert in transaction");
    tx.rollback().await.expect("rollback");

    assert!(env.record("0xtx").await.expect("query").is_none());

    let mut tx = env.pool().begin().await.expect("begin transaction");
    repo.upsert_in_tx(&mut tx, &record(CallRecordBuilder::new("0xtx")))
        .await
        .expect("upsert in transaction");
    tx.commit().await.expect("commit");

    assert!(env.record("0xtx").await.expect("query").is_some());

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn unparseable_timestamp_is_rejected_by_store() {
    let env = TestEnv::new().await.expect("test env setup");

    let bad = record(CallRecordBuilder::new("0xbadtime").field("started_at", "not-a-timestamp"));
    let err = env.storage().call_records.upsert(&bad).await.expect_err("store must reject");

    assert!(matches!(err, CoreError::InvalidInput(_)), "unexpected error: {err:?}");
    assert_eq!(env.record_count().await.expect("count"), 0);

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn price_is_rounded_to_six_decimal_places() {
    let env = TestEnv::new().await.expect("test env setup");

    let precise = record(CallRecordBuilder::new("0xround").field("price_usdc", "0.1234567"));
    env.storage().call_records.upsert(&precise).await.expect("upsert");

    let stored = env.record("0xround").await.expect("query").expect("record stored");
    assert_eq!(stored.price_usdc, BigDecimal::from_str("0.123457").expect("decimal"));

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn schema_bootstrap_is_idempotent() {
    let env = TestEnv::new().await.expect("test env setup");
    let storage = env.storage();

    storage.ensure_schema().await.expect("second ensure_schema");
    storage.health_check().await.expect("health check");
    storage.database_time().await.expect("database time");

    env.cleanup().await.expect("cleanup");
}

#[tokio::test]
async fn unreachable_database_fails_health_check() {
    let storage = paylog_testing::unreachable_storage().expect("lazy pool");

    let err = storage.health_check().await.expect_err("health check must fail");

    assert!(matches!(err, CoreError::Database(_)), "unexpected error: {err:?}");
}
