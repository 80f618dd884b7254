//! Authentication middleware and extractors.
//!
//! Extractors for requiring a verified bearer access token, optionally
//! gated on a role, in route handlers. Verification is pure HMAC work on
//! the token; no database read happens per request.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use warung_core::Role;

use crate::error::ApiError;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid access token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, state).map(Self)
    }
}

/// Extractor that requires a valid access token with the ADMIN role.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(&parts.headers, state)?;
        if user.role != Role::Admin {
            return Err(ApiError::Forbidden("Access denied, admin only".to_string()));
        }
        Ok(Self(user))
    }
}

/// Extractor that requires a valid access token with the CUSTOMER role.
pub struct RequireCustomer(pub CurrentUser);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(&parts.headers, state)?;
        if user.role != Role::Customer {
            return Err(ApiError::Forbidden(
                "Access denied, customer only".to_string(),
            ));
        }
        Ok(Self(user))
    }
}

/// Verify the bearer token and build the request's `CurrentUser`.
fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<CurrentUser, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized, token not provided".to_string()))?;

    let claims = state
        .tokens()
        .verify_access_token(token)
        .map_err(|_| ApiError::InvalidToken("Invalid or expired token".to_string()))?;

    Ok(CurrentUser {
        id: claims.user_id,
        username: claims.username,
        email: claims.email,
        role: claims.role,
    })
}

/// Extract the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );

        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_non_bearer_scheme_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer abc.def.ghi"),
        );

        assert_eq!(bearer_token(&headers), None);
    }
}
