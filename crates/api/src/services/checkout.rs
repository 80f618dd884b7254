//! Checkout orchestration.
//!
//! Converts a customer's cart into a PENDING transaction. Validation is
//! fail-fast in a fixed order: user, post code, shipping completeness,
//! cart contents, payment method. Only after everything passes does the
//! repository run the atomic convert-and-clear transaction.

use sqlx::PgPool;
use thiserror::Error;

use warung_core::{PaymentMethod, UserId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::transactions::TransactionRepository;
use crate::db::users::UserRepository;
use crate::models::transaction::ShippingSnapshot;
use crate::models::{FieldError, TransactionWithDetails, User};

/// Largest accepted post code (5 digits).
const MAX_POST_CODE: i32 = 99_999;

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The authenticated user no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// One or more request fields failed validation.
    #[error("checkout validation failed")]
    Validation(Vec<FieldError>),

    /// The cart has no lines to convert.
    #[error("cart is empty")]
    EmptyCart,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout fields as submitted by the client.
///
/// Shipping fields are optional; absent ones fall back to the user's
/// profile. `payment_method` arrives as a raw string and is parsed into
/// the closed enum here, at the boundary.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct CheckoutRequest {
    /// Shipping address override.
    pub address: Option<String>,
    /// Shipping city override.
    pub city: Option<String>,
    /// Shipping post code override.
    pub post_code: Option<i32>,
    /// Contact phone override.
    pub phone_number: Option<String>,
    /// Free-form order notes.
    pub notes: Option<String>,
    /// Requested payment method, `TRANSFER` or `COD`.
    pub payment_method: Option<String>,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    users: UserRepository<'a>,
    carts: CartRepository<'a>,
    transactions: TransactionRepository<'a>,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            carts: CartRepository::new(pool),
            transactions: TransactionRepository::new(pool),
        }
    }

    /// Convert the user's cart into a PENDING transaction.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::UserNotFound` if the user row is gone.
    /// Returns `CheckoutError::Validation` for post code, shipping, or
    /// payment method problems. Returns `CheckoutError::EmptyCart` if
    /// there is nothing to check out.
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: CheckoutRequest,
    ) -> Result<TransactionWithDetails, CheckoutError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(CheckoutError::UserNotFound)?;

        let shipping = resolve_shipping(&user, &request)?;

        // Cheap pre-check so an empty cart reports before a bad payment
        // method; the conversion re-reads the cart under lock anyway.
        if self.carts.list_for_user(user_id).await?.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let payment_method = parse_payment_method(request.payment_method.as_deref())?;

        self.transactions
            .checkout_cart(user_id, &shipping, payment_method, request.notes.as_deref())
            .await?
            // Lost a race with a concurrent checkout of the same cart.
            .ok_or(CheckoutError::EmptyCart)
    }
}

/// Merge request shipping fields over the user's profile and require the
/// result to be complete.
///
/// A blank request field counts as absent and falls back to the profile.
/// `post_code` is validated against its range before the merge.
///
/// # Errors
///
/// Returns `CheckoutError::Validation` with one entry per problem field.
fn resolve_shipping(
    user: &User,
    request: &CheckoutRequest,
) -> Result<ShippingSnapshot, CheckoutError> {
    if let Some(post_code) = request.post_code {
        if post_code < 0 {
            return Err(CheckoutError::Validation(vec![FieldError::new(
                "post_code",
                "Post code cannot be negative",
            )]));
        }
        if post_code > MAX_POST_CODE {
            return Err(CheckoutError::Validation(vec![FieldError::new(
                "post_code",
                "Post code cannot be more than 5 digits",
            )]));
        }
    }

    let address = pick(request.address.as_deref(), user.address.as_deref());
    let city = pick(request.city.as_deref(), user.city.as_deref());
    let post_code = request.post_code.or(user.post_code);
    let phone_number = pick(request.phone_number.as_deref(), user.phone_number.as_deref());

    let mut missing = Vec::new();
    if address.is_none() {
        missing.push(FieldError::new("address", "Address is required"));
    }
    if city.is_none() {
        missing.push(FieldError::new("city", "City is required"));
    }
    if post_code.is_none() {
        missing.push(FieldError::new("post_code", "Post code is required"));
    }
    if phone_number.is_none() {
        missing.push(FieldError::new("phone_number", "Phone number is required"));
    }

    let (Some(address), Some(city), Some(post_code), Some(phone_number)) =
        (address, city, post_code, phone_number)
    else {
        return Err(CheckoutError::Validation(missing));
    };

    Ok(ShippingSnapshot {
        address: address.to_string(),
        city: city.to_string(),
        post_code,
        phone_number: phone_number.to_string(),
    })
}

/// First non-blank value, request over profile.
fn pick<'v>(request: Option<&'v str>, profile: Option<&'v str>) -> Option<&'v str> {
    request
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| profile.map(str::trim).filter(|s| !s.is_empty()))
}

/// Parse the requested payment method into the closed enum.
///
/// # Errors
///
/// Returns `CheckoutError::Validation` if the method is absent or not one
/// of `TRANSFER` / `COD`.
fn parse_payment_method(raw: Option<&str>) -> Result<PaymentMethod, CheckoutError> {
    let Some(raw) = raw else {
        return Err(CheckoutError::Validation(vec![FieldError::new(
            "payment_method",
            "Please select a payment method",
        )]));
    };

    raw.trim().to_uppercase().parse().map_err(|_| {
        CheckoutError::Validation(vec![FieldError::new(
            "payment_method",
            "Payment method must be TRANSFER or COD",
        )])
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use warung_core::{Email, Role, UserId};

    use super::*;

    fn profile_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            username: "siti".to_string(),
            email: Email::parse("siti@example.com").unwrap(),
            role: Role::Customer,
            address: Some("Jl. Melati 4".to_string()),
            city: Some("Bandung".to_string()),
            post_code: Some(40111),
            phone_number: Some("081234567890".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    fn paths(err: CheckoutError) -> Vec<String> {
        match err {
            CheckoutError::Validation(fields) => fields.into_iter().map(|f| f.path).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_request_fields_override_profile() {
        let request = CheckoutRequest {
            address: Some("Jl. Kenanga 9".to_string()),
            city: Some("Jakarta".to_string()),
            post_code: Some(10110),
            phone_number: Some("089876543210".to_string()),
            ..CheckoutRequest::default()
        };

        let shipping = resolve_shipping(&profile_user(), &request).unwrap();

        assert_eq!(shipping.address, "Jl. Kenanga 9");
        assert_eq!(shipping.city, "Jakarta");
        assert_eq!(shipping.post_code, 10110);
        assert_eq!(shipping.phone_number, "089876543210");
    }

    #[test]
    fn test_absent_fields_fall_back_to_profile() {
        let shipping = resolve_shipping(&profile_user(), &CheckoutRequest::default()).unwrap();

        assert_eq!(shipping.address, "Jl. Melati 4");
        assert_eq!(shipping.city, "Bandung");
        assert_eq!(shipping.post_code, 40111);
        assert_eq!(shipping.phone_number, "081234567890");
    }

    #[test]
    fn test_blank_request_field_falls_back_to_profile() {
        let request = CheckoutRequest {
            address: Some("   ".to_string()),
            ..CheckoutRequest::default()
        };

        let shipping = resolve_shipping(&profile_user(), &request).unwrap();

        assert_eq!(shipping.address, "Jl. Melati 4");
    }

    #[test]
    fn test_missing_fields_are_reported_together() {
        let mut user = profile_user();
        user.address = None;
        user.city = None;
        user.post_code = None;
        user.phone_number = None;

        let err = resolve_shipping(&user, &CheckoutRequest::default()).unwrap_err();

        assert_eq!(
            paths(err),
            vec!["address", "city", "post_code", "phone_number"]
        );
    }

    #[test]
    fn test_negative_post_code_is_rejected() {
        let request = CheckoutRequest {
            post_code: Some(-1),
            ..CheckoutRequest::default()
        };

        let err = resolve_shipping(&profile_user(), &request).unwrap_err();
        let CheckoutError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields[0].path, "post_code");
        assert_eq!(fields[0].message, "Post code cannot be negative");
    }

    #[test]
    fn test_six_digit_post_code_is_rejected() {
        let request = CheckoutRequest {
            post_code: Some(100_000),
            ..CheckoutRequest::default()
        };

        let err = resolve_shipping(&profile_user(), &request).unwrap_err();
        let CheckoutError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields[0].message, "Post code cannot be more than 5 digits");
    }

    #[test]
    fn test_zero_post_code_counts_as_provided() {
        let request = CheckoutRequest {
            post_code: Some(0),
            ..CheckoutRequest::default()
        };

        let shipping = resolve_shipping(&profile_user(), &request).unwrap();

        assert_eq!(shipping.post_code, 0);
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            parse_payment_method(Some("COD")).unwrap(),
            PaymentMethod::Cod
        );
        assert_eq!(
            parse_payment_method(Some(" transfer ")).unwrap(),
            PaymentMethod::Transfer
        );
    }

    #[test]
    fn test_payment_method_must_be_selected() {
        let err = parse_payment_method(None).unwrap_err();
        let CheckoutError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields[0].path, "payment_method");
        assert_eq!(fields[0].message, "Please select a payment method");
    }

    #[test]
    fn test_unknown_payment_method_is_rejected() {
        let err = parse_payment_method(Some("PAYPAL")).unwrap_err();
        let CheckoutError::Validation(fields) = err else {
            panic!("expected validation error");
        };

        assert_eq!(fields[0].message, "Payment method must be TRANSFER or COD");
    }
}
