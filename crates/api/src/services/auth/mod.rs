//! Authentication service.
//!
//! Registration, the two role-gated login portals, refresh token rotation,
//! and logout. Passwords are hashed with Argon2id; refresh tokens are
//! stored on the user row so a login or logout invalidates every earlier
//! refresh token for that user.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use warung_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::tokens::TokenService;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Token pair returned by a successful login.
pub struct IssuedTokens {
    /// Short-lived bearer credential, returned in the response body.
    pub access: String,
    /// Long-lived credential, set as an `HttpOnly` cookie and persisted
    /// on the user row.
    pub refresh: String,
}

/// Authentication service.
///
/// Handles user registration, login, token refresh, and logout.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a new customer account.
    ///
    /// Every account created through this path gets the CUSTOMER role;
    /// admin accounts are provisioned out of band.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UsernameMissing` if the username is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::PasswordTooShort` / `AuthError::PasswordMismatch`
    /// if the password fails validation.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::UsernameMissing);
        }

        let email = Email::parse(email)?;

        validate_password(password)?;
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(username, &email, &password_hash, Role::Customer)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Login with email and password through a role-gated portal.
    ///
    /// On success a fresh refresh token replaces whatever value was stored
    /// for the user, so at most one refresh token per user is ever live.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailNotFound` if no account has the email.
    /// Returns `AuthError::WrongPassword` if the password does not match.
    /// Returns `AuthError::RoleMismatch` if the account's role does not
    /// match the portal.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expected_role: Role,
    ) -> Result<(User, IssuedTokens), AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .find_credentials_by_email(&email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        verify_password(password, &password_hash)?;

        if user.role != expected_role {
            return Err(AuthError::RoleMismatch {
                expected: expected_role,
            });
        }

        let access = self.tokens.issue_access_token(&user)?;
        let refresh = self.tokens.issue_refresh_token(user.id)?;

        self.users.set_refresh_token(user.id, Some(&refresh)).await?;

        Ok((user, IssuedTokens { access, refresh }))
    }

    // =========================================================================
    // Refresh & Logout
    // =========================================================================

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The store lookup runs first: a rotated-away token misses the store
    /// and is rejected before its signature is even inspected.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshTokenNotRecognized` if no user row holds
    /// this exact value. Returns `AuthError::RefreshTokenInvalid` if the
    /// stored value fails signature or expiry verification.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let user = self
            .users
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::RefreshTokenNotRecognized)?;

        self.tokens
            .verify_refresh_token(refresh_token)
            .map_err(|_| AuthError::RefreshTokenInvalid)?;

        Ok(self.tokens.issue_access_token(&user)?)
    }

    /// Invalidate the presented refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshTokenNotRecognized` if no user row holds
    /// this exact value.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::RefreshTokenNotRecognized)?;

        self.users.set_refresh_token(user.id, None).await?;

        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::PasswordTooShort);
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::WrongPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::WrongPassword)
}
