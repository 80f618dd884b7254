//! Product route handlers.
//!
//! Reads and search are public; writes require the ADMIN role. Prices
//! travel as JSON strings (`"15000.00"`) and parse into `Decimal`, never
//! floats.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use warung_core::{CategoryId, ProductId};

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::{ProductRepository, ProductWrite};
use crate::error::ApiError;
use crate::middleware::RequireAdmin;
use crate::models::{ApiResponse, FieldError, ListParams};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Product create/update request body.
#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub category_id: i32,
    pub name: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub description: Option<String>,
}

impl ProductPayload {
    /// Validate the payload and shape it for the repository.
    fn validate(&self) -> Result<ProductWrite, ApiError> {
        let mut fields = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            fields.push(FieldError::new("name", "Name is required"));
        }
        if self.price < Decimal::ZERO {
            fields.push(FieldError::new("price", "Price cannot be negative"));
        }
        if !fields.is_empty() {
            return Err(ApiError::Validation(fields));
        }

        Ok(ProductWrite {
            category_id: CategoryId::new(self.category_id),
            name: name.to_string(),
            image: self.image.clone(),
            price: self.price,
            description: self.description.clone(),
        })
    }
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List products, newest first.
///
/// GET /api/products
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let products = ProductRepository::new(state.pool())
        .list(params.limit(), params.offset())
        .await?;

    Ok(Json(ApiResponse::ok("Get all products success", products)))
}

/// Search products by product or category name.
///
/// GET /api/products/search?query=
///
/// # Errors
///
/// Returns `BadRequest` when the query parameter is absent or blank.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let term = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search query is required".to_string()))?;

    let products = ProductRepository::new(state.pool()).search(term).await?;

    Ok(Json(ApiResponse::ok("Products found", products)))
}

/// Get one product with its category.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = ProductRepository::new(state.pool())
        .find_with_category(ProductId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(ApiResponse::ok("Get product by id success", product)))
}

/// Create a product.
///
/// POST /api/products
///
/// # Errors
///
/// Returns `NotFound` when the category does not exist and a validation
/// error for a blank name, negative price, or already-taken name.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let write = body.validate()?;

    ensure_category_exists(&state, write.category_id).await?;

    let product = ProductRepository::new(state.pool())
        .create(&write)
        .await
        .map_err(|e| match e {
            // Category vanished between the check and the insert.
            RepositoryError::NotFound => ApiError::NotFound("Category not found".to_string()),
            other => map_name_conflict(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Create product success", product)),
    ))
}

/// Update a product.
///
/// PATCH /api/products/{id}
///
/// # Errors
///
/// Returns `NotFound` when the product or the target category does not
/// exist, and a validation error for a blank name, negative price, or
/// already-taken name.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<ProductPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let write = body.validate()?;

    ensure_category_exists(&state, write.category_id).await?;

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &write)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("Product not found".to_string()),
            other => map_name_conflict(other),
        })?;

    Ok(Json(ApiResponse::ok("Update product success", product)))
}

/// Delete a product.
///
/// DELETE /api/products/{id}
///
/// # Errors
///
/// Returns `NotFound` for unknown IDs and a conflict when the product
/// appears in transaction history.
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    Ok(Json(ApiResponse::message("Delete product success")))
}

/// Reject writes that reference a category that does not exist.
async fn ensure_category_exists(state: &AppState, id: CategoryId) -> Result<(), ApiError> {
    CategoryRepository::new(state.pool())
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(())
}

/// Present a unique-name violation as a field error on `name`.
fn map_name_conflict(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Conflict(_) => ApiError::Validation(vec![FieldError::new(
            "name",
            "Product name already exists",
        )]),
        other => ApiError::Database(other),
    }
}
