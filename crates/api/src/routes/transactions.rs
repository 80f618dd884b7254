//! Transaction route handlers.
//!
//! Checkout converts the customer's cart into a transaction atomically;
//! the remaining handlers walk the lifecycle: the customer uploads proof
//! of payment, then an admin settles the transaction to `SUCCESS` or
//! `CANCELLED`. Prices travel as JSON strings ("280000.00").

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use warung_core::TransactionId;

use crate::db::transactions::TransactionRepository;
use crate::error::{ApiError, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth, RequireCustomer};
use crate::models::{ApiResponse, FieldError, ListParams};
use crate::services::checkout::{CheckoutRequest, CheckoutService};
use crate::services::transactions::LifecycleService;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProofRequest {
    pub proof: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all transactions, newest first, without their lines.
///
/// GET /api/transactions
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = TransactionRepository::new(state.pool())
        .list(params.limit(), params.offset())
        .await?;

    Ok(Json(ApiResponse::ok(
        "Get all transactions success",
        transactions,
    )))
}

/// Convert the customer's cart into a transaction.
///
/// POST /api/transactions/checkout
///
/// Shipping fields missing from the body fall back to the customer's
/// profile; the cart itself is read, priced, and cleared inside one
/// database transaction.
///
/// # Errors
///
/// Returns a validation error for incomplete shipping details, a conflict
/// when the cart is empty, and `NotFound` when the account has vanished.
pub async fn checkout(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = CheckoutService::new(state.pool())
        .checkout(user.id, request)
        .await?;

    let transaction_id = created.transaction.id.to_string();
    add_breadcrumb(
        "transaction",
        "Checkout completed",
        Some(&[("transaction_id", transaction_id.as_str())]),
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Checkout success", created)),
    ))
}

/// List the authenticated customer's transactions with their lines.
///
/// GET /api/transactions/mytransactions
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn my_transactions(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = TransactionRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(ApiResponse::ok(
        "Get my transactions success",
        transactions,
    )))
}

/// Attach proof of payment to the customer's own transaction.
///
/// PUT /api/transactions/proof/{id}
///
/// The update is scoped to the authenticated customer, so another user's
/// transaction id reads as not found rather than forbidden.
///
/// # Errors
///
/// Returns a validation error for a blank proof and `NotFound` when the
/// transaction does not exist or belongs to someone else.
pub async fn upload_proof(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    Path(id): Path<i32>,
    Json(request): Json<ProofRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let proof = request.proof.trim();
    if proof.is_empty() {
        return Err(ApiError::Validation(vec![FieldError::new(
            "proof",
            "Proof of payment is required",
        )]));
    }

    LifecycleService::new(state.pool())
        .upload_proof(TransactionId::new(id), user.id, proof)
        .await?;

    let transaction_id = id.to_string();
    add_breadcrumb(
        "transaction",
        "Proof of payment uploaded",
        Some(&[("transaction_id", transaction_id.as_str())]),
    );

    Ok(Json(ApiResponse::message("Upload proof success")))
}

/// Fetch one transaction with its lines.
///
/// GET /api/transactions/{id}
///
/// # Errors
///
/// Returns `NotFound` when the transaction does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = TransactionRepository::new(state.pool())
        .find_by_id(TransactionId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))?;

    Ok(Json(ApiResponse::ok(
        "Get transaction by id success",
        transaction,
    )))
}

/// Settle a pending transaction to `SUCCESS` or `CANCELLED`.
///
/// PUT /api/transactions/{id}/{status}
///
/// Settlement is one-shot: a transaction leaves `PENDING` exactly once,
/// and `SUCCESS` additionally requires uploaded proof of payment.
///
/// # Errors
///
/// Returns a validation error for an unknown status, `NotFound` for a
/// missing transaction, a conflict when already settled, and a
/// precondition failure when proof is missing.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((id, status)): Path<(i32, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let settled = LifecycleService::new(state.pool())
        .update_status(TransactionId::new(id), &status)
        .await?;

    let transaction_id = id.to_string();
    add_breadcrumb(
        "transaction",
        "Transaction settled",
        Some(&[
            ("transaction_id", transaction_id.as_str()),
            ("status", settled.as_str()),
        ]),
    );

    Ok(Json(ApiResponse::message(format!("Transaction {settled}"))))
}
