//! paylog HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use config::Config;
pub use error::ApiError;
pub use server::{create_router, create_router_with_config, start_server, AppState, RouterConfig};
