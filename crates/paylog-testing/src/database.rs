//! Database management for integration tests.
//!
//! Every test gets its own PostgreSQL database, created from the server named
//! by `DATABASE_URL` and dropped again when the handle goes away.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

// Limits concurrent CREATE DATABASE statements
static DB_CREATION_SEMAPHORE: Semaphore = Semaphore::const_new(3);

/// Isolated test database with its own PostgreSQL database.
#[derive(Debug)]
pub struct IsolatedTestDatabase {
    pool: PgPool,
    database_name: String,
}

impl IsolatedTestDatabase {
    /// Creates a fresh, empty database and connects to it.
    pub async fn new() -> Result<Self> {
        let admin_pool = create_admin_pool().await?;

        let database_name = format!("paylog_test_{}", Uuid::new_v4().simple());
        create_database(&admin_pool, &database_name).await?;
        admin_pool.close().await;

        let pool = create_database_pool(&database_name).await?;

        info!("created isolated test database: {}", database_name);

        Ok(Self { pool, database_name })
    }

    /// Access to the database pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get the database name.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Closes the pool and drops the database.
    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;
        let admin_pool = create_admin_pool().await?;
        drop_database_immediate(&admin_pool, &self.database_name).await?;
        admin_pool.close().await;
        Ok(())
    }
}

/// Creates an empty database.
pub async fn create_database(admin_pool: &PgPool, database_name: &str) -> Result<()> {
    let start_time = Instant::now();

    let _permit =
        DB_CREATION_SEMAPHORE.acquire().await.context("database creation semaphore closed")?;

    sqlx::query(&format!("CREATE DATABASE \"{database_name}\""))
        .execute(admin_pool)
        .await
        .with_context(|| format!("failed to create database {database_name}"))?;

    let duration = start_time.elapsed();
    if duration > Duration::from_millis(500) {
        warn!("Database creation took {}ms for {}", duration.as_millis(), database_name);
    } else {
        debug!("created database {} in {}ms", database_name, duration.as_millis());
    }

    Ok(())
}

/// Drop database immediately with connection termination.
pub async fn drop_database_immediate(admin_pool: &PgPool, database_name: &str) -> Result<()> {
    let _ = sqlx::query(
        "SELECT pg_terminate_backend(pid)
         FROM pg_stat_activity
         WHERE datname = $1
         AND pid <> pg_backend_pid()",
    )
    .bind(database_name)
    .execute(admin_pool)
    .await;

    sqlx::query(&format!("DROP DATABASE IF EXISTS \"{database_name}\""))
        .execute(admin_pool)
        .await
        .with_context(|| format!("failed to drop database: {database_name}"))?;

    Ok(())
}

fn connect_options() -> Result<PgConnectOptions> {
    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

    database_url.parse::<PgConnectOptions>().context("failed to parse DATABASE_URL")
}

/// Create admin connection pool for database management operations.
///
/// Not cached: each `#[tokio::test]` runs on its own runtime and a pool
/// cannot outlive the runtime that created it.
pub async fn create_admin_pool() -> Result<PgPool> {
    let opts = connect_options()?.database("postgres");

    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(opts)
        .await
        .context("failed to connect to admin database")
}

/// Create connection pool for specific database.
pub async fn create_database_pool(database_name: &str) -> Result<PgPool> {
    let start_time = Instant::now();
    let opts = connect_options()?.database(database_name);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(0)
        .idle_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(opts)
        .await
        .with_context(|| {
            format!("failed to create connection pool for database: {database_name}")
        })?;

    debug!("created database pool for {} in {}ms", database_name, start_time.elapsed().as_millis());

    Ok(pool)
}
