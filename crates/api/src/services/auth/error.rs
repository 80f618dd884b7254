//! Authentication error types.

use thiserror::Error;

use warung_core::{EmailError, Role};

use crate::db::RepositoryError;
use crate::services::tokens::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Registration submitted without a username.
    #[error("username is required")]
    UsernameMissing,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Email is already registered.
    #[error("email already registered")]
    EmailTaken,

    /// Password shorter than the minimum length.
    #[error("password too short")]
    PasswordTooShort,

    /// Password and confirmation differ.
    #[error("password confirmation does not match")]
    PasswordMismatch,

    /// No account with the submitted email.
    #[error("email not found")]
    EmailNotFound,

    /// Password did not match the stored hash.
    #[error("wrong password")]
    WrongPassword,

    /// Logged in through the wrong portal for the account's role.
    #[error("role mismatch, expected {expected}")]
    RoleMismatch {
        /// Role the login portal requires.
        expected: Role,
    },

    /// Refresh token does not match any stored value.
    #[error("refresh token not recognized")]
    RefreshTokenNotRecognized,

    /// Refresh token failed signature or expiry verification.
    #[error("refresh token invalid")]
    RefreshTokenInvalid,

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
