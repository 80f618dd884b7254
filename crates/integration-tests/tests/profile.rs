//! Integration tests for profile updates and admin user management.
//!
//! Profile updates merge submitted fields over stored ones. Admin user
//! endpoints only ever see CUSTOMER accounts, and responses never carry
//! credential material.
//!
//! Run with: cargo test -p warung-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use warung_core::Role;
use warung_integration_tests::{
    admin_token, api_base_url, client, customer_token, login, register_customer, unique_name,
};

/// Update the authenticated customer's profile and return the user data.
async fn patch_profile(client: &Client, token: &str, body: &Value) -> Value {
    let base_url = api_base_url();
    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);

    let mut body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Profile updated successfully");
    body["data"].take()
}

// ============================================================================
// Profile Update Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_merges_fields() {
    let client = client();
    let token = customer_token(&client, "profile").await;

    let data = patch_profile(
        &client,
        &token,
        &json!({ "username": "Siti Rahayu", "address": "Jl. Melati 4" }),
    )
    .await;
    assert_eq!(data["username"], "Siti Rahayu");
    assert_eq!(data["address"], "Jl. Melati 4");
    assert!(data["city"].is_null());

    // A later update leaves earlier fields alone
    let data =
        patch_profile(&client, &token, &json!({ "city": "Bandung", "post_code": 40111 })).await;
    assert_eq!(data["username"], "Siti Rahayu");
    assert_eq!(data["address"], "Jl. Melati 4");
    assert_eq!(data["city"], "Bandung");
    assert_eq!(data["post_code"], 40111);

    // Credential material never leaves the server
    assert!(data.get("password").is_none());
    assert!(data.get("password_hash").is_none());
    assert!(data.get("refresh_token").is_none());
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_rejects_empty_body() {
    let client = client();
    let base_url = api_base_url();
    let token = customer_token(&client, "emptybody").await;

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "No fields are updated");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_validates_fields() {
    let client = client();
    let base_url = api_base_url();
    let token = customer_token(&client, "badprofile").await;

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&token)
        .json(&json!({ "username": "   " }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["errors"][0]["path"], "username");
    assert_eq!(body["errors"][0]["message"], "Username is required");

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["errors"][0]["path"], "email");
    assert_eq!(body["errors"][0]["message"], "Invalid email format");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_rejects_taken_email() {
    let client = client();
    let base_url = api_base_url();
    let (taken_email, _) = register_customer(&client, "emailtaken").await;
    let token = customer_token(&client, "emailthief").await;

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&token)
        .json(&json!({ "email": taken_email }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["errors"][0]["path"], "email");
    assert_eq!(body["errors"][0]["message"], "Email already exists");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_update_is_customer_only() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&admin)
        .json(&json!({ "city": "Jakarta" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Access denied, customer only");
}

// ============================================================================
// Admin User Management Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_lists_customers_only() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    // Make sure at least one customer exists
    register_customer(&client, "listed").await;

    let resp = client
        .get(format!("{base_url}/api/users"))
        .bearer_auth(&admin)
        .query(&[("limit", "50")])
        .send()
        .await
        .expect("Failed to list users");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get all users success");
    let users = body["data"].as_array().expect("Data should be an array");
    assert!(!users.is_empty());
    for user in users {
        assert_eq!(user["role"], Role::Customer.as_str());
        assert!(user.get("password_hash").is_none());
        assert!(user.get("refresh_token").is_none());
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_user_detail_and_delete() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (email, password) = register_customer(&client, "deleteme").await;
    let token = login(&client, "customer", &email, &password).await;

    // The profile response carries the account's ID
    let data = patch_profile(&client, &token, &json!({ "city": "Surabaya" })).await;
    let id = data["id"].as_i64().expect("User ID missing");

    let resp = client
        .get(format!("{base_url}/api/users/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to fetch user");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get user by id success");
    assert_eq!(body["data"]["email"], email);

    let resp = client
        .delete(format!("{base_url}/api/users/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to delete user");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Delete user success");

    // The account is gone for both the admin and the former owner
    let resp = client
        .get(format!("{base_url}/api/users/{id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to fetch user");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "User not found");

    let resp = client
        .post(format!("{base_url}/api/customer/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Email not found");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_customer_with_history_cannot_be_deleted() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    // Seed a product and give the customer a transaction
    let resp = client
        .post(format!("{base_url}/api/category"))
        .bearer_auth(&admin)
        .json(&json!({ "name": unique_name("History") }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let category_id = body["data"]["id"].as_i64().expect("Category ID missing");

    let resp = client
        .post(format!("{base_url}/api/products"))
        .bearer_auth(&admin)
        .json(&json!({
            "category_id": category_id,
            "name": unique_name("Keeper"),
            "price": "50.00",
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let product_id = body["data"]["id"].as_i64().expect("Product ID missing");

    let token = customer_token(&client, "history").await;
    let resp = client
        .post(format!("{base_url}/api/carts/add/{product_id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{base_url}/api/transactions/checkout"))
        .bearer_auth(&token)
        .json(&json!({
            "address": "Jl. Mawar 12",
            "city": "Yogyakarta",
            "post_code": 55281,
            "phone_number": "081298765432",
            "payment_method": "COD",
        }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let user_id = body["data"]["user_id"].as_i64().expect("User ID missing");

    // Transaction history blocks deletion
    let resp = client
        .delete(format!("{base_url}/api/users/{user_id}"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "User has transaction history");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_user_routes_forbidden_for_customers() {
    let client = client();
    let base_url = api_base_url();
    let token = customer_token(&client, "nosnoop").await;

    let resp = client
        .get(format!("{base_url}/api/users"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{base_url}/api/users/1"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .delete(format!("{base_url}/api/users/1"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
