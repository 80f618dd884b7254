//! Category route handlers.
//!
//! Reads are public; writes require the ADMIN role.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use warung_core::CategoryId;

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::error::ApiError;
use crate::middleware::RequireAdmin;
use crate::models::{ApiResponse, FieldError, ListParams};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Category create/update request body.
#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    pub image: Option<String>,
}

impl CategoryPayload {
    /// Trimmed name, rejecting blank input.
    fn validated_name(&self) -> Result<&str, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation(vec![FieldError::new(
                "name",
                "Name is required",
            )]));
        }
        Ok(name)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List categories, newest first.
///
/// GET /api/category
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let categories = CategoryRepository::new(state.pool())
        .list(params.limit(), params.offset())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Get all categories success",
        categories,
    )))
}

/// Get one category.
///
/// GET /api/category/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let category = CategoryRepository::new(state.pool())
        .find_by_id(CategoryId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(ApiResponse::ok("Get category by id success", category)))
}

/// Create a category.
///
/// POST /api/category
///
/// # Errors
///
/// Returns a validation error for a blank or already-taken name.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.validated_name()?;

    let category = CategoryRepository::new(state.pool())
        .create(name, body.image.as_deref())
        .await
        .map_err(map_name_conflict)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Create category success", category)),
    ))
}

/// Update a category.
///
/// PATCH /api/category/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs and a validation error for a blank
/// or already-taken name.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.validated_name()?;

    let category = CategoryRepository::new(state.pool())
        .update(CategoryId::new(id), name, body.image.as_deref())
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("Category not found".to_string()),
            other => map_name_conflict(other),
        })?;

    Ok(Json(ApiResponse::ok("Update category success", category)))
}

/// Delete a category.
///
/// DELETE /api/category/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs and a conflict when products still
/// reference the category.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    Ok(Json(ApiResponse::message("Delete category success")))
}

/// Present a unique-name violation as a field error on `name`.
fn map_name_conflict(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Conflict(_) => ApiError::Validation(vec![FieldError::new(
            "name",
            "Category name already exists",
        )]),
        other => ApiError::Database(other),
    }
}
