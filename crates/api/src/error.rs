//! Unified error handling with Sentry integration.
//!
//! Provides a unified `ApiError` type that renders every failure as the
//! JSON envelope and captures server errors to Sentry before responding.
//! All route handlers should return `Result<T, ApiError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use warung_core::Role;

use crate::db::RepositoryError;
use crate::models::{ApiResponse, FieldError};
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::transactions::LifecycleError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Transaction lifecycle operation failed.
    #[error("Transaction error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Request field validation failed.
    #[error("Validation error")]
    Validation(Vec<FieldError>),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No credential presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Credential presented but expired or garbled.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status, client-facing message, and field errors for this error.
    ///
    /// Internal details never reach the client; database and signing
    /// failures all collapse to a generic message.
    fn response_parts(&self) -> (StatusCode, String, Option<Vec<FieldError>>) {
        match self {
            Self::Database(err) => repository_parts(err),
            Self::Auth(err) => auth_parts(err),
            Self::Checkout(err) => checkout_parts(err),
            Self::Lifecycle(err) => lifecycle_parts(err),
            Self::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(fields.clone()),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        }
    }
}

fn repository_parts(err: &RepositoryError) -> (StatusCode, String, Option<Vec<FieldError>>) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string(), None),
        RepositoryError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            None,
        ),
    }
}

fn auth_parts(err: &AuthError) -> (StatusCode, String, Option<Vec<FieldError>>) {
    let validation = |path: &str, message: &str| {
        (
            StatusCode::BAD_REQUEST,
            "Validation error".to_string(),
            Some(vec![FieldError::new(path, message)]),
        )
    };

    match err {
        AuthError::UsernameMissing => validation("username", "Username is required"),
        AuthError::InvalidEmail(_) => validation("email", "Invalid email format"),
        AuthError::EmailTaken => validation("email", "Email already exists"),
        AuthError::PasswordTooShort => {
            validation("password", "Password must be at least 6 characters")
        }
        AuthError::PasswordMismatch => validation("confirm_password", "Passwords do not match"),
        AuthError::WrongPassword => validation("password", "Wrong password"),
        AuthError::EmailNotFound => (
            StatusCode::NOT_FOUND,
            "Email not found".to_string(),
            Some(vec![FieldError::new("email", "Email not found")]),
        ),
        AuthError::RoleMismatch { expected } => {
            let message = match expected {
                Role::Admin => "Access denied, you are not an admin",
                Role::Customer => "Access denied, you are not a customer",
            };
            (
                StatusCode::FORBIDDEN,
                message.to_string(),
                Some(vec![FieldError::new("role", message)]),
            )
        }
        AuthError::RefreshTokenNotRecognized | AuthError::RefreshTokenInvalid => (
            StatusCode::FORBIDDEN,
            "Invalid refresh token".to_string(),
            None,
        ),
        AuthError::Repository(err) => repository_parts(err),
        AuthError::Token(_) | AuthError::PasswordHash => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
            None,
        ),
    }
}

fn checkout_parts(err: &CheckoutError) -> (StatusCode, String, Option<Vec<FieldError>>) {
    match err {
        CheckoutError::UserNotFound => {
            (StatusCode::NOT_FOUND, "User not found".to_string(), None)
        }
        CheckoutError::Validation(fields) => (
            StatusCode::BAD_REQUEST,
            "Validation error".to_string(),
            Some(fields.clone()),
        ),
        CheckoutError::EmptyCart => (StatusCode::CONFLICT, "No items in cart".to_string(), None),
        CheckoutError::Repository(err) => repository_parts(err),
    }
}

fn lifecycle_parts(err: &LifecycleError) -> (StatusCode, String, Option<Vec<FieldError>>) {
    match err {
        LifecycleError::InvalidStatus => (
            StatusCode::BAD_REQUEST,
            "Validation error".to_string(),
            Some(vec![FieldError::new(
                "status",
                "Status must be SUCCESS or CANCELLED",
            )]),
        ),
        LifecycleError::NotFound => (
            StatusCode::NOT_FOUND,
            "Transaction not found".to_string(),
            None,
        ),
        LifecycleError::AlreadySettled => (
            StatusCode::CONFLICT,
            "Transaction status already updated".to_string(),
            None,
        ),
        LifecycleError::ProofRequired => (
            StatusCode::PRECONDITION_FAILED,
            "Customer must include proof of payment first".to_string(),
            None,
        ),
        LifecycleError::Repository(err) => repository_parts(err),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = self.response_parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match errors {
            Some(errors) => ApiResponse::error_with(message, errors),
            None => ApiResponse::error(message),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
