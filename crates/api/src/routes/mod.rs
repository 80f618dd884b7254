//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness check
//! GET    /health/ready                    - Readiness check (pings Postgres)
//!
//! # Auth (public)
//! POST   /api/register                    - Create a customer account
//! POST   /api/admin/login                 - Admin login portal
//! POST   /api/customer/login              - Customer login portal
//! GET    /api/token                       - Exchange refresh cookie for access token
//! DELETE /api/logout                      - Invalidate refresh token, clear cookie
//!
//! # Catalog (public reads, admin writes)
//! GET    /api/category                    - Category listing
//! GET    /api/category/{id}               - Category detail
//! POST   /api/category                    - Create category          (admin)
//! PATCH  /api/category/{id}               - Update category          (admin)
//! DELETE /api/category/{id}               - Delete category          (admin)
//! GET    /api/products                    - Product listing
//! GET    /api/products/search?query=      - Product search
//! GET    /api/products/{id}               - Product detail with category
//! POST   /api/products                    - Create product           (admin)
//! PATCH  /api/products/{id}               - Update product           (admin)
//! DELETE /api/products/{id}               - Delete product           (admin)
//!
//! # Users
//! GET    /api/users                       - Customer listing         (admin)
//! GET    /api/users/{id}                  - Customer detail          (admin)
//! DELETE /api/users/{id}                  - Delete customer          (admin)
//! PATCH  /api/users/profile               - Update own profile       (customer)
//!
//! # Carts
//! GET    /api/carts                       - All cart lines           (admin)
//! GET    /api/carts/mycart                - Own cart                 (customer)
//! POST   /api/carts/add/{product_id}      - Add/increment a line     (customer)
//! DELETE /api/carts/delete/{product_id}   - Decrement/remove a line  (customer)
//!
//! # Transactions
//! GET    /api/transactions                - Transaction listing      (admin)
//! PUT    /api/transactions/{id}/{status}  - Settle a transaction     (admin)
//! POST   /api/transactions/checkout       - Convert cart             (customer)
//! PUT    /api/transactions/proof/{id}     - Upload payment proof     (customer)
//! GET    /api/transactions/mytransactions - Own transactions         (customer)
//! GET    /api/transactions/{id}           - Transaction detail       (any authed)
//! ```
//!
//! Static segments win over parameters, so `/api/products/search` and
//! `/api/transactions/mytransactions` never shadow the `{id}` routes.

pub mod auth;
pub mod carts;
pub mod categories;
pub mod products;
pub mod transactions;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/admin/login", post(auth::admin_login))
        .route("/customer/login", post(auth::customer_login))
        .route("/token", get(auth::refresh))
        .route("/logout", delete(auth::logout))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .patch(categories::update)
                .delete(categories::remove),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/search", get(products::search))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::remove),
        )
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list))
        .route("/profile", axum::routing::patch(users::update_profile))
        .route("/{id}", get(users::show).delete(users::remove))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(carts::list))
        .route("/mycart", get(carts::my_cart))
        .route("/add/{product_id}", post(carts::add_item))
        .route("/delete/{product_id}", delete(carts::remove_item))
}

/// Create the transaction routes router.
pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(transactions::list))
        .route("/checkout", post(transactions::checkout))
        .route("/mytransactions", get(transactions::my_transactions))
        .route("/proof/{id}", put(transactions::upload_proof))
        .route("/{id}", get(transactions::show))
        .route("/{id}/{status}", put(transactions::update_status))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(auth_routes())
        .nest("/category", category_routes())
        .nest("/products", product_routes())
        .nest("/users", user_routes())
        .nest("/carts", cart_routes())
        .nest("/transactions", transaction_routes());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/api", api)
}

/// Liveness check.
async fn health() -> &'static str {
    "ok"
}

/// Readiness check: verifies the database pool can serve a query.
async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(state.pool())
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok("ready")
}
