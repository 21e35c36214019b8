//! HTTP server for brand artifact generation.
//!
//! Exposes the generation pipeline and diagnostics over axum. Callers are
//! identified by the `x-user-id` header; authentication happens upstream.
//!
//! # Endpoints
//!
//! See [`routes`] for the full table.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{app_router, AppState, Owner, OWNER_HEADER};
