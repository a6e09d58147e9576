//! Database access layer for call records.
//!
//! All SQL lives under this module. Handlers go through [`Storage`], which
//! owns the connection pool and hands out the repositories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub mod call_records;
pub mod schema;

use crate::error::Result;

/// Entry point for all database operations.
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for call record operations.
    pub call_records: Arc<call_records::Repository>,
}

impl Storage {
    /// Creates a new storage instance over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);

        Self { call_records: Arc::new(call_records::Repository::new(pool)) }
    }

    /// Creates the `call_records` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the DDL cannot be executed. Callers
    /// at startup treat this as fatal.
    pub async fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.call_records.pool()).await
    }

    /// Performs a health check on the database connection.
    ///
    /// Executes a trivial round-trip query.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.call_records.pool()).await?;

        Ok(())
    }

    /// Returns the database server's current time.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the query fails.
    pub async fn database_time(&self) -> Result<DateTime<Utc>> {
        let now = sqlx::query_scalar("SELECT NOW()").fetch_one(&*self.call_records.pool()).await?;

        Ok(now)
    }
}
