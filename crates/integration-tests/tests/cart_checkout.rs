//! Integration tests for carts, checkout, and the transaction lifecycle.
//!
//! Each test registers its own customer, so carts never interfere across
//! tests or runs. Money assertions compare JSON strings; the API never
//! sends prices as floats.
//!
//! Run with: cargo test -p warung-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use warung_core::{PaymentMethod, PaymentStatus};
use warung_integration_tests::{admin_token, api_base_url, client, customer_token, unique_name};

/// Create a category and two products priced 100.00 and 10.00, returning
/// the product IDs.
async fn seed_products(client: &Client, admin: &str) -> (i64, i64) {
    let base_url = api_base_url();

    let resp = client
        .post(format!("{base_url}/api/category"))
        .bearer_auth(admin)
        .json(&json!({ "name": unique_name("Checkout") }))
        .send()
        .await
        .expect("Failed to create category");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    let category_id = body["data"]["id"].as_i64().expect("Category ID missing");

    let mut ids = Vec::new();
    for price in ["100.00", "10.00"] {
        let resp = client
            .post(format!("{base_url}/api/products"))
            .bearer_auth(admin)
            .json(&json!({
                "category_id": category_id,
                "name": unique_name("Item"),
                "price": price,
            }))
            .send()
            .await
            .expect("Failed to create product");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.expect("Failed to parse body");
        ids.push(body["data"]["id"].as_i64().expect("Product ID missing"));
    }

    (ids[0], ids[1])
}

/// Add one unit of a product to the authenticated customer's cart.
async fn add_to_cart(client: &Client, token: &str, product_id: i64) {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/api/carts/add/{product_id}"))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::CREATED);
}

/// A complete checkout body with in-request shipping details.
fn checkout_body() -> Value {
    json!({
        "address": "Jl. Mawar 12",
        "city": "Yogyakarta",
        "post_code": 55281,
        "phone_number": "081298765432",
        "payment_method": "TRANSFER",
    })
}

/// Check out the customer's cart and return the created transaction data.
async fn do_checkout(client: &Client, token: &str, body: &Value) -> Value {
    let base_url = api_base_url();
    let resp = client
        .post(format!("{base_url}/api/transactions/checkout"))
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let mut body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Checkout success");
    body["data"].take()
}

// ============================================================================
// Cart Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_add_increments_quantity() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "cartadd").await;

    let resp = client
        .post(format!("{base_url}/api/carts/add/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Add item to cart success");
    assert_eq!(body["data"]["quantity"], 1);

    // A second add bumps the same line instead of creating another
    let resp = client
        .post(format!("{base_url}/api/carts/add/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to add to cart");
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["data"]["quantity"], 2);

    let resp = client
        .get(format!("{base_url}/api/carts/mycart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get cart success");
    let items = body["data"].as_array().expect("Cart should be an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["product"]["id"].as_i64(), Some(product_a));
    assert_eq!(items[0]["product"]["price"], "100.00");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_remove_decrements_then_deletes() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "cartremove").await;

    add_to_cart(&client, &token, product_a).await;
    add_to_cart(&client, &token, product_a).await;

    // First remove decrements and returns the surviving line
    let resp = client
        .delete(format!("{base_url}/api/carts/delete/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to remove from cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Remove item success");
    assert_eq!(body["data"]["quantity"], 1);

    // Second remove deletes the line; no data comes back
    let resp = client
        .delete(format!("{base_url}/api/carts/delete/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to remove from cart");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Remove item success");
    assert!(body.get("data").is_none());

    let resp = client
        .get(format!("{base_url}/api/carts/mycart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch cart");
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    // The cart is now empty
    let resp = client
        .delete(format!("{base_url}/api/carts/delete/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_add_unknown_product() {
    let client = client();
    let base_url = api_base_url();
    let token = customer_token(&client, "cartghost").await;

    let resp = client
        .post(format!("{base_url}/api/carts/add/999999999"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Product not found");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_remove_product_not_in_cart() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, product_b) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "cartmiss").await;

    // Non-empty cart, but the removed product is a different one
    add_to_cart(&client, &token, product_b).await;

    let resp = client
        .delete(format!("{base_url}/api/carts/delete/{product_a}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Product not found in cart");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_admin_cart_listing_access() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let resp = client
        .get(format!("{base_url}/api/carts"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to list carts");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get all carts success");

    // Admins have no cart of their own
    let resp = client
        .get(format!("{base_url}/api/carts/mycart"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Access denied, customer only");

    // And customers cannot see everyone's carts
    let token = customer_token(&client, "cartlist").await;
    let resp = client
        .get(format!("{base_url}/api/carts"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Checkout Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_converts_cart_and_clears_it() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, product_b) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "checkout").await;

    // 2 x 100.00 + 5 x 10.00 = 250.00
    for _ in 0..2 {
        add_to_cart(&client, &token, product_a).await;
    }
    for _ in 0..5 {
        add_to_cart(&client, &token, product_b).await;
    }

    let data = do_checkout(&client, &token, &checkout_body()).await;

    assert_eq!(data["sub_total"], "250.00");
    assert_eq!(data["tax"], "25.00");
    assert_eq!(data["delivery_fee"], "5.00");
    assert_eq!(data["total_amount"], "280.00");
    assert_eq!(data["status"], PaymentStatus::Pending.as_str());
    assert_eq!(data["payment_method"], PaymentMethod::Transfer.as_str());
    assert_eq!(data["address"], "Jl. Mawar 12");
    assert_eq!(data["post_code"], 55281);
    assert!(data["proof"].is_null());

    // Lines snapshot the unit price at checkout time
    let details = data["details"].as_array().expect("Details missing");
    assert_eq!(details.len(), 2);
    let detail_for = |product_id: i64| {
        details
            .iter()
            .find(|d| d["product_id"].as_i64() == Some(product_id))
            .expect("Detail line missing")
    };
    assert_eq!(detail_for(product_a)["price"], "100.00");
    assert_eq!(detail_for(product_a)["quantity"], 2);
    assert_eq!(detail_for(product_b)["price"], "10.00");
    assert_eq!(detail_for(product_b)["quantity"], 5);

    // The conversion consumed the cart
    let resp = client
        .get(format!("{base_url}/api/carts/mycart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch cart");
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    // So a second checkout has nothing to convert
    let resp = client
        .post(format!("{base_url}/api/transactions/checkout"))
        .bearer_auth(&token)
        .json(&checkout_body())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "No items in cart");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_requires_complete_shipping() {
    let client = client();
    let base_url = api_base_url();
    // Fresh account with a blank profile and nothing in the body
    let token = customer_token(&client, "noshipping").await;

    let resp = client
        .post(format!("{base_url}/api/transactions/checkout"))
        .bearer_auth(&token)
        .json(&json!({ "payment_method": "COD" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Validation error");
    let paths: Vec<&str> = body["errors"]
        .as_array()
        .expect("Errors missing")
        .iter()
        .filter_map(|e| e["path"].as_str())
        .collect();
    assert_eq!(paths, vec!["address", "city", "post_code", "phone_number"]);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_shipping_falls_back_to_profile() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "profileship").await;

    let resp = client
        .patch(format!("{base_url}/api/users/profile"))
        .bearer_auth(&token)
        .json(&json!({
            "address": "Jl. Anggrek 7",
            "city": "Semarang",
            "post_code": 50135,
            "phone_number": "085612341234",
        }))
        .send()
        .await
        .expect("Failed to update profile");
    assert_eq!(resp.status(), StatusCode::OK);

    add_to_cart(&client, &token, product_a).await;

    // Only the payment method in the body; shipping comes from the profile
    let data = do_checkout(&client, &token, &json!({ "payment_method": "COD" })).await;

    assert_eq!(data["payment_method"], PaymentMethod::Cod.as_str());
    assert_eq!(data["address"], "Jl. Anggrek 7");
    assert_eq!(data["city"], "Semarang");
    assert_eq!(data["post_code"], 50135);
    assert_eq!(data["phone_number"], "085612341234");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_checkout_rejects_unknown_payment_method() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "badmethod").await;
    add_to_cart(&client, &token, product_a).await;

    let mut body = checkout_body();
    body["payment_method"] = json!("PAYPAL");

    let resp = client
        .post(format!("{base_url}/api/transactions/checkout"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["errors"][0]["path"], "payment_method");
    assert_eq!(
        body["errors"][0]["message"],
        "Payment method must be TRANSFER or COD"
    );
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_proof_then_settle_success() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "settle").await;
    add_to_cart(&client, &token, product_a).await;
    let data = do_checkout(&client, &token, &checkout_body()).await;
    let id = data["id"].as_i64().expect("Transaction ID missing");

    // SUCCESS is gated on proof of payment
    let resp = client
        .put(format!("{base_url}/api/transactions/{id}/SUCCESS"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Customer must include proof of payment first");

    let resp = client
        .put(format!("{base_url}/api/transactions/proof/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "proof": "transfer-receipt-001.jpg" }))
        .send()
        .await
        .expect("Failed to upload proof");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Upload proof success");

    let resp = client
        .put(format!("{base_url}/api/transactions/{id}/SUCCESS"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to settle");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Transaction SUCCESS");

    // Settlement is one-shot
    let resp = client
        .put(format!("{base_url}/api/transactions/{id}/CANCELLED"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Transaction status already updated");

    // The customer sees the settled state with proof attached
    let resp = client
        .get(format!("{base_url}/api/transactions/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to fetch transaction");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get transaction by id success");
    assert_eq!(body["data"]["status"], PaymentStatus::Success.as_str());
    assert_eq!(body["data"]["proof"], "transfer-receipt-001.jpg");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cancel_needs_no_proof() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "cancel").await;
    add_to_cart(&client, &token, product_a).await;
    let data = do_checkout(&client, &token, &checkout_body()).await;
    let id = data["id"].as_i64().expect("Transaction ID missing");

    let resp = client
        .put(format!("{base_url}/api/transactions/{id}/CANCELLED"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to settle");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Transaction CANCELLED");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_settle_rejects_unknown_status() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "badstatus").await;
    add_to_cart(&client, &token, product_a).await;
    let data = do_checkout(&client, &token, &checkout_body()).await;
    let id = data["id"].as_i64().expect("Transaction ID missing");

    // PENDING is not a valid settlement target either
    for target in ["REFUNDED", "PENDING"] {
        let resp = client
            .put(format!("{base_url}/api/transactions/{id}/{target}"))
            .bearer_auth(&admin)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("Failed to parse body");
        assert_eq!(body["errors"][0]["path"], "status");
        assert_eq!(
            body["errors"][0]["message"],
            "Status must be SUCCESS or CANCELLED"
        );
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_upload_proof_requires_content() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let token = customer_token(&client, "blankproof").await;
    add_to_cart(&client, &token, product_a).await;
    let data = do_checkout(&client, &token, &checkout_body()).await;
    let id = data["id"].as_i64().expect("Transaction ID missing");

    let resp = client
        .put(format!("{base_url}/api/transactions/proof/{id}"))
        .bearer_auth(&token)
        .json(&json!({ "proof": "   " }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["errors"][0]["path"], "proof");
    assert_eq!(body["errors"][0]["message"], "Proof of payment is required");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_upload_proof_scoped_to_owner() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, _) = seed_products(&client, &admin).await;
    let owner = customer_token(&client, "proofowner").await;
    add_to_cart(&client, &owner, product_a).await;
    let data = do_checkout(&client, &owner, &checkout_body()).await;
    let id = data["id"].as_i64().expect("Transaction ID missing");

    // Another customer gets not-found, not forbidden
    let intruder = customer_token(&client, "proofintruder").await;
    let resp = client
        .put(format!("{base_url}/api/transactions/proof/{id}"))
        .bearer_auth(&intruder)
        .json(&json!({ "proof": "stolen-receipt.jpg" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Transaction not found");
}

// ============================================================================
// Transaction Listing Tests
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_my_transactions_lists_own_only() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;
    let (product_a, product_b) = seed_products(&client, &admin).await;

    let first = customer_token(&client, "txowner").await;
    add_to_cart(&client, &first, product_a).await;
    let data = do_checkout(&client, &first, &checkout_body()).await;
    let first_id = data["id"].as_i64().expect("Transaction ID missing");
    let first_user = data["user_id"].as_i64().expect("User ID missing");

    let second = customer_token(&client, "txother").await;
    add_to_cart(&client, &second, product_b).await;
    let data = do_checkout(&client, &second, &checkout_body()).await;
    let second_id = data["id"].as_i64().expect("Transaction ID missing");

    let resp = client
        .get(format!("{base_url}/api/transactions/mytransactions"))
        .bearer_auth(&first)
        .send()
        .await
        .expect("Failed to fetch transactions");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get my transactions success");

    let items = body["data"].as_array().expect("Data should be an array");
    let ids: Vec<i64> = items.iter().filter_map(|t| t["id"].as_i64()).collect();
    assert!(ids.contains(&first_id));
    assert!(!ids.contains(&second_id));
    for item in items {
        assert_eq!(item["user_id"].as_i64(), Some(first_user));
        assert!(item["details"].is_array());
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_transaction_listing_is_admin_only() {
    let client = client();
    let base_url = api_base_url();
    let admin = admin_token(&client).await;

    let resp = client
        .get(format!("{base_url}/api/transactions"))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to list transactions");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["message"], "Get all transactions success");

    let token = customer_token(&client, "txlist").await;
    let resp = client
        .get(format!("{base_url}/api/transactions"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
