//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! warung-cli admin create -e admin@example.com -u "Store Admin" -p <password>
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! There is no admin registration endpoint; this command is the only way
//! an `ADMIN` account comes into existence.

use sqlx::PgPool;
use thiserror::Error;

use warung_api::db::{RepositoryError, UserRepository};
use warung_api::services::auth::{MIN_PASSWORD_LENGTH, hash_password};
use warung_core::{Email, Role, UserId};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Blank username.
    #[error("Username is required")]
    UsernameMissing,

    /// Password too short.
    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters")]
    WeakPassword,

    /// Account already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// Password hashing failed.
    #[error("Failed to hash password")]
    PasswordHash,

    /// Repository error.
    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `username` - Admin's display name
/// * `password` - Plaintext password, hashed with Argon2id before storage
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns `AdminError` if validation fails, the email is taken, or a
/// database operation fails.
pub async fn create_user(
    email: &str,
    username: &str,
    password: &str,
) -> Result<UserId, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;

    let username = username.trim();
    if username.is_empty() {
        return Err(AdminError::UsernameMissing);
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AdminError::WeakPassword);
    }

    let database_url = std::env::var("API_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AdminError::MissingEnvVar("API_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin account: {} ({})", email, username);

    let password_hash = hash_password(password).map_err(|_| AdminError::PasswordHash)?;

    let user = UserRepository::new(&pool)
        .create(username, &email, &password_hash, Role::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
