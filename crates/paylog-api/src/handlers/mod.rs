//! HTTP request handlers.
//!
//! - `index` - landing page with the database clock
//! - `health` - database connectivity probe
//! - `ingest` - call record ingestion
//!
//! Handlers return [`crate::ApiError`] for failures so every error response
//! shares one JSON shape.

pub mod health;
pub mod index;
pub mod ingest;

pub use health::health_check;
pub use index::index;
pub use ingest::ingest_call_record;
