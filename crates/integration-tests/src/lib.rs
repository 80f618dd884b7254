//! Integration tests for the Warung API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! cargo run -p warung-cli -- migrate
//!
//! # Create the admin account the tests log in with
//! cargo run -p warung-cli -- admin create \
//!     -e admin@warung.test -u "Store Admin" -p <ADMIN_PASSWORD>
//!
//! # Start the API
//! cargo run -p warung-api
//!
//! # Run the ignored integration tests
//! cargo test -p warung-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `API_BASE_URL` - API address (default: `http://localhost:3000`)
//! - `ADMIN_EMAIL` - Admin login email (default: `admin@warung.test`)
//! - `ADMIN_PASSWORD` - Admin login password (default: `admin-password`)
//!
//! Tests create their own customer accounts with unique emails, so they
//! can be re-run against the same database without cleanup.

use reqwest::Client;
use serde_json::Value;
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn api_base_url() -> String {
    std::env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Admin login email (the account created via `warung-cli admin create`).
#[must_use]
pub fn admin_email() -> String {
    std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@warung.test".to_string())
}

/// Admin login password.
#[must_use]
pub fn admin_password() -> String {
    std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".to_string())
}

/// HTTP client with a cookie store, so the refresh cookie round-trips.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique email for a throwaway test account.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@warung.test", Uuid::new_v4().simple())
}

/// A unique display name for throwaway categories and products.
///
/// Catalog names are unique, so tests mint fresh ones to stay re-runnable
/// against the same database.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

/// Register a customer account and return its credentials.
///
/// # Panics
///
/// Panics if the request fails or registration is rejected.
pub async fn register_customer(client: &Client, prefix: &str) -> (String, String) {
    let base_url = api_base_url();
    let email = unique_email(prefix);
    let password = "customer-password".to_string();

    let resp = client
        .post(format!("{base_url}/api/register"))
        .json(&serde_json::json!({
            "username": format!("Test {prefix}"),
            "email": email,
            "password": password,
            "confirm_password": password,
        }))
        .send()
        .await
        .expect("Failed to register customer");
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    (email, password)
}

/// Log in through a portal and return the access token.
///
/// # Panics
///
/// Panics if the request fails or the login is rejected.
pub async fn login(client: &Client, portal: &str, email: &str, password: &str) -> String {
    let base_url = api_base_url();

    let resp = client
        .post(format!("{base_url}/api/{portal}/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse login response");
    body["data"]["accessToken"]
        .as_str()
        .expect("Login response missing accessToken")
        .to_string()
}

/// Log in as the pre-provisioned admin account.
pub async fn admin_token(client: &Client) -> String {
    login(client, "admin", &admin_email(), &admin_password()).await
}

/// Register a fresh customer, log in, and return the access token.
pub async fn customer_token(client: &Client, prefix: &str) -> String {
    let (email, password) = register_customer(client, prefix).await;
    login(client, "customer", &email, &password).await
}
