//! Cart route handlers.
//!
//! A cart line is keyed by (user, product); adding an existing product
//! bumps its quantity and removing decrements it, deleting the line at
//! zero. Both mutations are single atomic SQL statements, so concurrent
//! clicks cannot lose updates.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use warung_core::ProductId;

use crate::db::RepositoryError;
use crate::db::carts::{CartRepository, RemoveOutcome};
use crate::error::ApiError;
use crate::middleware::{RequireAdmin, RequireCustomer};
use crate::models::{ApiResponse, ListParams};
use crate::state::AppState;

/// List cart lines across all users.
///
/// GET /api/carts
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let items = CartRepository::new(state.pool())
        .list_all(params.limit(), params.offset())
        .await?;

    Ok(Json(ApiResponse::ok("Get all carts success", items)))
}

/// List the authenticated customer's cart.
///
/// GET /api/carts/mycart
///
/// An empty cart is a successful response with an empty list.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn my_cart(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> Result<impl IntoResponse, ApiError> {
    let items = CartRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(ApiResponse::ok("Get cart success", items)))
}

/// Add a product to the cart, or bump its quantity by one.
///
/// POST /api/carts/add/{product_id}
///
/// # Errors
///
/// Returns `NotFound` when the product does not exist.
pub async fn add_item(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let line = CartRepository::new(state.pool())
        .add_item(user.id, ProductId::new(product_id))
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ApiError::NotFound("Product not found".to_string()),
            other => ApiError::Database(other),
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Add item to cart success", line)),
    ))
}

/// Decrement a cart line by one, removing it at zero.
///
/// DELETE /api/carts/delete/{product_id}
///
/// # Errors
///
/// Returns `NotFound` when the cart is empty or the product is not in it.
pub async fn remove_item(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = CartRepository::new(state.pool())
        .remove_item(user.id, ProductId::new(product_id))
        .await?;

    match outcome {
        RemoveOutcome::Decremented(line) => {
            Ok(Json(ApiResponse::ok("Remove item success", line)).into_response())
        }
        RemoveOutcome::Removed => {
            Ok(Json(ApiResponse::message("Remove item success")).into_response())
        }
        RemoveOutcome::NotInCart => Err(ApiError::NotFound(
            "Product not found in cart".to_string(),
        )),
        RemoveOutcome::EmptyCart => Err(ApiError::NotFound("Cart is empty".to_string())),
    }
}
