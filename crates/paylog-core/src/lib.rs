//! Core domain models, validation and storage for call record ingestion.
//!
//! Provides the typed call record, the payload validator, the IP allow-list
//! guard and the PostgreSQL-backed store. The HTTP layer depends on these
//! types and never talks to the database directly.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod error;
pub mod models;
pub mod storage;
pub mod validation;

pub use access::{AccessDecision, AllowList};
pub use error::{CoreError, Result};
pub use models::{CallRecord, CallStatus, ErrorCategory, NewCallRecord, UpsertReceipt};
pub use storage::Storage;
pub use validation::{validate, FieldError};
