//! gateway-server: HTTP API server for the Health Gateway
//!
//! This crate provides:
//! - REST API endpoints for notes, feedback, communications and patient data
//! - Bearer token authentication and FHIR resource authorization
//! - Delegates for BC Mail Plus, PHSA, CDOGS and Keycloak
//!
//! # Architecture
//!
//! Handlers authorize the caller, then call a service. Services own the
//! business rules and talk to storage and upstream systems through delegate
//! traits, so every service can run against in-process mocks.
//!
//! The server is built on Axum with a middleware stack for:
//! - Request tracing and logging
//! - CORS handling
//! - Request ID generation
//! - JSON error responses
//!
//! # Usage
//!
//! ```rust,ignore
//! use gateway_server::{AppState, Delegates, ServerConfig, routes};
//!
//! let config = ServerConfig::from_env()?;
//! let delegates = Delegates::rest(store, client, &config);
//! let app = routes::build_router(AppState::new(config, delegates));
//! ```

pub mod config;
pub mod delegates;
pub mod error;
pub mod extract;
pub mod http;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-exports for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use state::{AppState, Delegates};

// Re-export dependent crates
pub use gateway_core;
pub use gateway_store;
