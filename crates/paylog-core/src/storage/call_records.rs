//! Repository for call record database operations.
//!
//! Writes are idempotent per transaction hash: the first write inserts the
//! row, later writes merge into it.

use std::sync::Arc;

use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{CallRecord, NewCallRecord, UpsertReceipt},
};

/// Repository for call record database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Inserts a call record or merges it into the existing row with the same
    /// transaction hash.
    ///
    /// On conflict the outcome columns are overwritten and `updated_at` is
    /// refreshed. `tx_hash`, `arg_count`, `price_usdc`, `transferred_usdc`,
    /// `started_at` and `created_at` keep the values of the first write.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails, including unparseable
    /// timestamps and check constraint violations.
    pub async fn upsert(&self, record: &NewCallRecord) -> Result<UpsertReceipt> {
        self.upsert_impl(&*self.pool, record).await
    }

    /// Upserts a call record within a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the statement fails.
    pub async fn upsert_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        record: &NewCallRecord,
    ) -> Result<UpsertReceipt> {
        self.upsert_impl(&mut **tx, record).await
    }

    async fn upsert_impl<'e, E>(&self, executor: E, record: &NewCallRecord) -> Result<UpsertReceipt>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, UpsertReceipt>(
            r"
            INSERT INTO call_records (
                tx_hash, provider, provider_node, source_node, arg_count,
                price_usdc, transferred_usdc, status, started_at, completed_at,
                total_duration_ms, successful_attempt, total_attempts, response_size_bytes,
                error_type, error_message, validation_error, payment_validated
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9::timestamptz, $10::timestamptz,
                $11, $12, $13, $14, $15, $16, $17, $18
            )
            ON CONFLICT (tx_hash) DO UPDATE SET
                provider = EXCLUDED.provider,
                provider_node = EXCLUDED.provider_node,
                source_node = EXCLUDED.source_node,
                status = EXCLUDED.status,
                completed_at = EXCLUDED.completed_at,
                total_duration_ms = EXCLUDED.total_duration_ms,
                successful_attempt = EXCLUDED.successful_attempt,
                total_attempts = EXCLUDED.total_attempts,
                response_size_bytes = EXCLUDED.response_size_bytes,
                error_type = EXCLUDED.error_type,
                error_message = EXCLUDED.error_message,
                validation_error = EXCLUDED.validation_error,
                payment_validated = EXCLUDED.payment_validated,
                updated_at = NOW()
            RETURNING id, tx_hash, created_at, updated_at
            ",
        )
        .bind(&record.tx_hash)
        .bind(&record.provider)
        .bind(&record.provider_node)
        .bind(&record.source_node)
        .bind(record.arg_count)
        .bind(&record.price_usdc)
        .bind(&record.transferred_usdc)
        .bind(record.status)
        .bind(&record.started_at)
        .bind(&record.completed_at)
        .bind(record.total_duration_ms)
        .bind(record.successful_attempt)
        .bind(record.total_attempts)
        .bind(record.response_size_bytes)
        .bind(record.error_type)
        .bind(&record.error_message)
        .bind(&record.validation_error)
        .bind(record.payment_validated)
        .fetch_one(executor)
        .await?;

        Ok(receipt)
    }

    /// Finds a call record by transaction hash.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_tx_hash(&self, tx_hash: &str) -> Result<Option<CallRecord>> {
        let record = sqlx::query_as::<_, CallRecord>(
            r"
            SELECT id, tx_hash, provider, provider_node, source_node, arg_count,
                   price_usdc, transferred_usdc, status, started_at, completed_at,
                   total_duration_ms, successful_attempt, total_attempts, response_size_bytes,
                   error_type, error_message, validation_error, payment_validated,
                   created_at, updated_at
            FROM call_records
            WHERE tx_hash = $1
            ",
        )
        .bind(tx_hash)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(record)
    }

    /// Counts stored call records.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM call_records")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
