//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors, start performance transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (single configured origin, or permissive in development)
//!
//! Authentication is not a layer: handlers opt in per route through the
//! [`auth`] extractors, which verify the bearer token without touching
//! the database.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth, RequireCustomer};
pub use request_id::request_id_middleware;
