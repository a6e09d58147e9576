//! paylog ingestion service.
//!
//! Main entry point. Loads configuration, connects to PostgreSQL, makes sure
//! the `call_records` table exists and serves the HTTP API until shutdown.

use std::time::Duration;

use anyhow::{Context, Result};
use paylog_api::{start_server, AppState, Config};
use paylog_core::Storage;
use sqlx::PgPool;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.rust_log)?;

    info!("Starting paylog ingestion service");

    let addr = config.parse_server_addr()?;
    let allow_list = config.allow_list();
    info!(
        database_url = %config.database_url_masked(),
        server_addr = %addr,
        max_connections = config.database_max_connections,
        allowed_ips = allow_list.len(),
        "Configuration loaded"
    );

    if allow_list.is_empty() {
        warn!("ALLOWED_IPS is empty; every call record submission will be rejected");
    }

    let db_pool = create_database_pool(&config).await?;
    info!("Database connection pool established");

    let storage = Storage::new(db_pool.clone());
    storage.ensure_schema().await.context("Failed to create call_records table")?;
    info!("Database schema ready");

    let state = AppState::new(storage, allow_list);
    start_server(state, addr, config.to_router_config()).await.context("Server failed")?;

    db_pool.close().await;
    info!("Database connections closed");

    info!("paylog shutdown complete");
    Ok(())
}

/// Initializes tracing from the configured filter directives.
fn init_tracing(directives: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(directives).context("Invalid RUST_LOG filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()?;
    Ok(())
}

/// Creates the database connection pool with retry logic.
async fn create_database_pool(config: &Config) -> Result<PgPool> {
    const MAX_RETRIES: u32 = 5;
    const RETRY_DELAY: Duration = Duration::from_secs(2);

    let mut retries = 0;

    loop {
        match config.to_pool_options().connect(&config.database_url).await {
            Ok(pool) => {
                sqlx::query("SELECT 1")
                    .fetch_one(&pool)
                    .await
                    .context("Failed to verify database connection")?;

                return Ok(pool);
            },
            Err(e) if retries < MAX_RETRIES => {
                retries += 1;
                warn!(
                    error = %e,
                    attempt = retries,
                    max_retries = MAX_RETRIES,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(RETRY_DELAY).await;
            },
            Err(e) => {
                return Err(e).context("Failed to create database connection pool after retries");
            },
        }
    }
}
