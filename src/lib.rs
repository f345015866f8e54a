//! veil - redacting HTTP exchange logger
//!
//! Intercepts HTTP traffic on both sides (axum server middleware, reqwest
//! client wrapper) and emits one structured event per request and response,
//! carrying correlation ids, while keeping configured fields out of the logs:
//! redacted fields are replaced by `REDACTED`, masked fields keep only their
//! outer thirds.
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{middleware, routing::post, Router};
//! use veil::exchange::{log_exchange, HttpLogger};
//! use veil::redact::Policy;
//!
//! let logger = Arc::new(HttpLogger::new(Policy::default_keys()).with_ignored_paths(["/health"]));
//! let app: Router = Router::new()
//!     .route("/accounts", post(|body: String| async move { body }))
//!     .layer(middleware::from_fn_with_state(logger, log_exchange));
//! ```

pub mod capture;
pub mod cli;
pub mod config;
pub mod exchange;
pub mod logging;
pub mod redact;
