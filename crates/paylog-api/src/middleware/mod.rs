//! HTTP middleware for request authorization.
//!
//! The ingestion route is guarded by a static IP allow-list; other routes are
//! public.
pub mod access;
