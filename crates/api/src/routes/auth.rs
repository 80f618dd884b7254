//! Authentication route handlers.
//!
//! Registration, the two role-gated login portals, refresh, and logout.
//! The refresh token never appears in a response body; it travels only in
//! an `HttpOnly` cookie scoped to the whole site.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use warung_core::Role;

use crate::error::{ApiError, clear_sentry_user, set_sentry_user};
use crate::models::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::tokens::REFRESH_TOKEN_TTL_SECS;
use crate::state::AppState;

/// Name of the refresh token cookie.
const REFRESH_COOKIE: &str = "refreshToken";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload carrying a fresh access token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenData {
    pub access_token: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new customer account.
///
/// POST /api/register
///
/// # Errors
///
/// Returns a validation error for a blank username, malformed email,
/// short password, or mismatched confirmation, and for an email that is
/// already registered.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let auth = AuthService::new(state.pool(), state.tokens());

    auth.register(
        &body.username,
        &body.email,
        &body.password,
        &body.confirm_password,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("Register success")),
    ))
}

/// Login through the admin portal.
///
/// POST /api/admin/login
///
/// # Errors
///
/// Returns `NotFound` for an unknown email, a validation error for a
/// wrong password, and `Forbidden` when the account is not an admin.
pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    login(&state, &body, Role::Admin).await
}

/// Login through the customer portal.
///
/// POST /api/customer/login
///
/// # Errors
///
/// Returns `NotFound` for an unknown email, a validation error for a
/// wrong password, and `Forbidden` when the account is not a customer.
pub async fn customer_login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    login(&state, &body, Role::Customer).await
}

/// Shared login flow: authenticate, rotate the refresh token, set the
/// cookie, and return the access token.
async fn login(state: &AppState, body: &LoginRequest, role: Role) -> Result<Response, ApiError> {
    let auth = AuthService::new(state.pool(), state.tokens());

    let (user, tokens) = auth.login(&body.email, &body.password, role).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((
        AppendHeaders([(header::SET_COOKIE, refresh_cookie(&tokens.refresh))]),
        Json(ApiResponse::ok(
            "Login Success",
            AccessTokenData {
                access_token: tokens.access,
            },
        )),
    )
        .into_response())
}

/// Exchange the refresh cookie for a fresh access token.
///
/// GET /api/token
///
/// # Errors
///
/// Returns `Unauthorized` when the cookie is absent and `Forbidden` when
/// its value is unknown or fails verification.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_token_from_headers(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token not provided".to_string()))?;

    let auth = AuthService::new(state.pool(), state.tokens());
    let access = auth.refresh(&token).await?;

    Ok(Json(ApiResponse::ok(
        "Token refreshed",
        AccessTokenData {
            access_token: access,
        },
    )))
}

/// Invalidate the refresh token and clear its cookie.
///
/// DELETE /api/logout
///
/// Responds 204 with no body.
///
/// # Errors
///
/// Returns `Unauthorized` when the cookie is absent and `Forbidden` when
/// its value is unknown.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = refresh_token_from_headers(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Refresh token not provided".to_string()))?;

    let auth = AuthService::new(state.pool(), state.tokens());
    auth.logout(&token).await?;

    clear_sentry_user();

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, clear_refresh_cookie())]),
    ))
}

// =============================================================================
// Cookie helpers
// =============================================================================

/// Build the `Set-Cookie` value that installs the refresh token.
fn refresh_cookie(token: &str) -> String {
    format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={REFRESH_TOKEN_TTL_SECS}"
    )
}

/// Build the `Set-Cookie` value that clears the refresh token.
fn clear_refresh_cookie() -> String {
    format!("{REFRESH_COOKIE}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0")
}

/// Read the refresh token out of the `Cookie` header, if present.
fn refresh_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == REFRESH_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc.def.ghi");

        assert!(cookie.starts_with("refreshToken=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie();

        assert!(cookie.starts_with("refreshToken=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_refresh_token_parsed_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; lang=id"),
        );

        assert_eq!(
            refresh_token_from_headers(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn test_missing_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));

        assert_eq!(refresh_token_from_headers(&headers), None);
        assert_eq!(refresh_token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_name_is_exact() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("refreshtoken=abc; xrefreshToken=def"),
        );

        assert_eq!(refresh_token_from_headers(&headers), None);
    }
}
