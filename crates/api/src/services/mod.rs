//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Registration, portal logins, refresh rotation, logout
//! - `tokens` - HS256 access/refresh token signing and verification
//! - `checkout` - Cart-to-transaction conversion with shipping validation
//! - `transactions` - Proof upload and the one-shot settlement gate
//!
//! Services own validation and orchestration; repositories under
//! [`crate::db`] own SQL. Handlers construct services per request from the
//! shared pool, so services borrow rather than clone.

pub mod auth;
pub mod checkout;
pub mod tokens;
pub mod transactions;
