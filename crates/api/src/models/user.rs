//! User domain types.
//!
//! These types represent validated domain objects separate from database
//! row types. Credential material (password hash, stored refresh token)
//! never appears here, so a `User` is always safe to serialize.

use chrono::{DateTime, Utc};
use serde::Serialize;

use warung_core::{Email, Role, UserId};

/// A registered account (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub username: String,
    /// Normalized email address.
    pub email: Email,
    /// Account role.
    pub role: Role,
    /// Street address for shipping, if set.
    pub address: Option<String>,
    /// City for shipping, if set.
    pub city: Option<String>,
    /// Postal code for shipping, if set.
    pub post_code: Option<i32>,
    /// Contact phone number, if set.
    pub phone_number: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller, decoded from a verified access token.
///
/// Carries exactly what the token claims carry; no database read happens
/// during extraction.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// Display name at token issue time.
    pub username: String,
    /// Email at token issue time.
    pub email: Email,
    /// Role at token issue time.
    pub role: Role,
}
