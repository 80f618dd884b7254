//! Database operations for the Warung `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Accounts for both roles, plus the single refresh-token slot
//! - `categories` - Product categories
//! - `products` - Catalog entries referencing a category
//! - `carts` - One row per (user, product) pair with a quantity
//! - `transactions` - Checkouts awaiting or past settlement
//! - `transaction_details` - Priced lines frozen at checkout time
//!
//! Enumerated columns (`role`, `status`, `payment_method`) are stored as
//! TEXT with CHECK constraints and parsed into closed enums at this
//! boundary; an unrecognized stored value surfaces as
//! [`RepositoryError::DataCorruption`], never as a panic.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p warung-cli -- migrate
//! ```

pub mod carts;
pub mod categories;
pub mod products;
pub mod transactions;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::{CartRepository, RemoveOutcome};
pub use categories::CategoryRepository;
pub use products::ProductRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
