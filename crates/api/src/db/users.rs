//! User repository for database operations.
//!
//! Queries are written at runtime against the `users` table; every read
//! goes through [`UserRow`] so role and email values are validated once,
//! at the storage boundary.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use warung_core::{Email, Role, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// Final profile values to persist, already merged over the stored row.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: Email,
    pub address: Option<String>,
    pub city: Option<String>,
    pub post_code: Option<i32>,
    pub phone_number: Option<String>,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
        role: Role,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, role, address, city, post_code,
                      phone_number, created_at, updated_at
            ",
        )
        .bind(username)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("Email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.into_user()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email or role is invalid.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, role, address, city, post_code,
                   phone_number, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Get a user and their password hash by email.
    ///
    /// Returns `None` if no account uses the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_credentials_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r"
            SELECT id, username, email, role, address, city, post_code,
                   phone_number, created_at, updated_at, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(CredentialsRow::into_parts).transpose()
    }

    /// Get the user currently holding `refresh_token`.
    ///
    /// The token slot is single-valued, so a rotated-out or cleared token
    /// matches nobody.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, role, address, city, post_code,
                   phone_number, created_at, updated_at
            FROM users
            WHERE refresh_token = $1
            ",
        )
        .bind(refresh_token)
        .fetch_optional(self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    /// Store (or clear, with `None`) the user's refresh token.
    ///
    /// Each user has exactly one slot: writing a new token invalidates the
    /// previous one, and `None` revokes the session entirely.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_refresh_token(
        &self,
        id: UserId,
        refresh_token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET refresh_token = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(refresh_token)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Overwrite a user's profile with merged values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        profile: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            UPDATE users
            SET username = $2, email = $3, address = $4, city = $5,
                post_code = $6, phone_number = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, role, address, city, post_code,
                      phone_number, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&profile.username)
        .bind(profile.email.as_str())
        .bind(profile.address.as_deref())
        .bind(profile.city.as_deref())
        .bind(profile.post_code)
        .bind(profile.phone_number.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("Email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        row.ok_or(RepositoryError::NotFound)?.into_user()
    }

    /// List customer accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_customers(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, email, role, address, city, post_code,
                   phone_number, created_at, updated_at
            FROM users
            WHERE role = 'CUSTOMER'
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Delete a customer account. Admin rows are never touched.
    ///
    /// Returns `false` when no customer row matched the ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user still has transactions.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete_customer(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM users
            WHERE id = $1 AND role = 'CUSTOMER'
            ",
        )
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::Conflict("User has transaction history".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    role: String,
    address: Option<String>,
    city: Option<String>,
    post_code: Option<i32>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role: Role = self.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(User {
            id: UserId::new(self.id),
            username: self.username,
            email,
            role,
            address: self.address,
            city: self.city,
            post_code: self.post_code,
            phone_number: self.phone_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: i32,
    username: String,
    email: String,
    role: String,
    address: Option<String>,
    city: Option<String>,
    post_code: Option<i32>,
    phone_number: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    password_hash: String,
}

impl CredentialsRow {
    fn into_parts(self) -> Result<(User, String), RepositoryError> {
        let password_hash = self.password_hash;
        let user = UserRow {
            id: self.id,
            username: self.username,
            email: self.email,
            role: self.role,
            address: self.address,
            city: self.city,
            post_code: self.post_code,
            phone_number: self.phone_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user()?;

        Ok((user, password_hash))
    }
}
