// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Shopgate API Library
//!
//! HTTP host for the Shopgate entitlement core: session-token identity,
//! guard middleware and the app's billing routes.

pub mod auth;
pub mod config;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use routes::create_router;
pub use state::AppState;
