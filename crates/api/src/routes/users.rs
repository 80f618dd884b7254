//! User route handlers.
//!
//! Admin endpoints see CUSTOMER accounts only; admin accounts are
//! invisible to the listing, detail, and delete endpoints. Customers can
//! update their own profile. Password hashes never leave the repository
//! layer, so no handler here can leak one.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use warung_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::{ProfileUpdate, UserRepository};
use crate::error::ApiError;
use crate::middleware::{RequireAdmin, RequireCustomer};
use crate::models::{ApiResponse, FieldError, ListParams};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Profile update request body; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub post_code: Option<i32>,
    pub phone_number: Option<String>,
}

impl UpdateProfileRequest {
    /// True when the body carries nothing to change.
    fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.post_code.is_none()
            && self.phone_number.is_none()
    }
}

// =============================================================================
// Admin Handlers
// =============================================================================

/// List customer accounts, newest first.
///
/// GET /api/users
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let users = UserRepository::new(state.pool())
        .list_customers(params.limit(), params.offset())
        .await?;

    Ok(Json(ApiResponse::ok("Get all users success", users)))
}

/// Get one customer account.
///
/// GET /api/users/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs and for admin accounts.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = UserRepository::new(state.pool())
        .find_by_id(UserId::new(id))
        .await?
        .filter(|u| u.role == Role::Customer)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok("Get user by id success", user)))
}

/// Delete a customer account.
///
/// DELETE /api/users/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs and for admin accounts, and a
/// conflict when the customer has transaction history.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = UserRepository::new(state.pool())
        .delete_customer(UserId::new(id))
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(ApiResponse::message("Delete user success")))
}

// =============================================================================
// Customer Handlers
// =============================================================================

/// Update the authenticated customer's profile.
///
/// PATCH /api/users/profile
///
/// Merge semantics: each submitted field replaces the stored one, absent
/// fields are untouched. An entirely empty body is rejected.
///
/// # Errors
///
/// Returns `BadRequest` for an empty body and validation errors for a
/// blank username, malformed email, or an email another account owns.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("No fields are updated".to_string()));
    }

    let users = UserRepository::new(state.pool());
    let current = users
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let username = match body.username {
        Some(raw) => {
            let trimmed = raw.trim().to_string();
            if trimmed.is_empty() {
                return Err(ApiError::Validation(vec![FieldError::new(
                    "username",
                    "Username is required",
                )]));
            }
            trimmed
        }
        None => current.username,
    };

    let email = match body.email {
        Some(raw) => Email::parse(&raw).map_err(|_| {
            ApiError::Validation(vec![FieldError::new("email", "Invalid email format")])
        })?,
        None => current.email,
    };

    let update = ProfileUpdate {
        username,
        email,
        address: body.address.or(current.address),
        city: body.city.or(current.city),
        post_code: body.post_code.or(current.post_code),
        phone_number: body.phone_number.or(current.phone_number),
    };

    let updated = users
        .update_profile(user.id, &update)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ApiError::Validation(vec![FieldError::new("email", "Email already exists")])
            }
            RepositoryError::NotFound => ApiError::NotFound("User not found".to_string()),
            other => ApiError::Database(other),
        })?;

    Ok(Json(ApiResponse::ok("Profile updated successfully", updated)))
}
