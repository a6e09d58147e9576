//! Table bootstrap.
//!
//! There is no migration framework: the table is created if absent and never
//! altered afterwards.

use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;

const CREATE_CALL_RECORDS: &str = r"
CREATE TABLE IF NOT EXISTS call_records (
    id BIGSERIAL PRIMARY KEY,
    tx_hash TEXT NOT NULL UNIQUE,
    provider TEXT NOT NULL,
    provider_node TEXT NOT NULL,
    source_node TEXT NOT NULL,
    arg_count INTEGER NOT NULL,
    price_usdc NUMERIC(20, 6) NOT NULL,
    transferred_usdc NUMERIC(20, 6) NOT NULL,
    status TEXT NOT NULL CHECK (status IN ('Success', 'Failed')),
    started_at TIMESTAMPTZ NOT NULL,
    completed_at TIMESTAMPTZ,
    total_duration_ms BIGINT,
    successful_attempt INTEGER NOT NULL,
    total_attempts INTEGER NOT NULL,
    response_size_bytes BIGINT,
    error_type TEXT CHECK (
        error_type IS NULL
        OR error_type IN (
            'ProviderNotFound', 'PaymentValidationFailed', 'AllRetriesFailed', 'ApiCallFailed'
        )
    ),
    error_message TEXT,
    validation_error TEXT,
    payment_validated BOOLEAN NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
";

/// Creates the `call_records` table if it does not exist.
///
/// # Errors
///
/// Returns error if the statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_CALL_RECORDS).execute(pool).await?;
    debug!("call_records table ready");

    Ok(())
}
