//! Access and refresh token issuance and verification.
//!
//! Two independent HS256 secrets sign two token families:
//!
//! | Token   | Claims                                              | Lifetime |
//! |---------|-----------------------------------------------------|----------|
//! | access  | `userId`, `username`, `email`, `role`, `iat`, `exp` | 20 min   |
//! | refresh | `userId`, `iat`, `exp`                              | 1 day    |
//!
//! Access tokens are stateless bearer credentials. Refresh tokens are
//! additionally persisted on the user row; rotation overwrites the stored
//! value, so at most one refresh token per user is live at a time.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warung_core::{Email, Role, UserId};

use crate::models::User;

/// Access token lifetime.
const ACCESS_TOKEN_TTL_SECS: i64 = 20 * 60;

/// Refresh token lifetime; also the `Max-Age` of the refresh cookie.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Errors from token signing or verification.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token signature is valid but the token has expired.
    #[error("token expired")]
    Expired,

    /// Token is malformed, signed with the wrong key, or missing claims.
    #[error("token invalid")]
    Invalid,

    /// Signing a new token failed.
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Authenticated user ID.
    pub user_id: UserId,
    /// Display name at issue time.
    pub username: String,
    /// Email at issue time.
    pub email: Email,
    /// Role at issue time; the session gate trusts this without a DB read.
    pub role: Role,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Claims carried by a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    /// User the refresh token was issued to.
    pub user_id: UserId,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Issues and verifies the two token families.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the two configured secrets.
    #[must_use]
    pub fn new(access_secret: &SecretString, refresh_secret: &SecretString) -> Self {
        let access = access_secret.expose_secret().as_bytes();
        let refresh = refresh_secret.expose_secret().as_bytes();

        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Sign a fresh access token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + ACCESS_TOKEN_TTL_SECS,
        };

        Ok(encode(&Header::default(), &claims, &self.access_encoding)?)
    }

    /// Sign a fresh refresh token for `user_id`.
    ///
    /// The caller is responsible for persisting the returned value on the
    /// user row; only the stored value is accepted for refresh.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_refresh_token(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            user_id,
            iat: now,
            exp: now + REFRESH_TOKEN_TTL_SECS,
        };

        Ok(encode(&Header::default(), &claims, &self.refresh_encoding)?)
    }

    /// Verify an access token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` if the token is past its `exp`.
    /// Returns `TokenError::Invalid` for any other verification failure.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        decode::<AccessClaims>(token, &self.access_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// Verify a refresh token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` if the token is past its `exp`.
    /// Returns `TokenError::Invalid` for any other verification failure.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use secrecy::SecretString;

    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("h9mB3kQ7pX2vR5tY8wA1cF4jL6nS0dGz"),
            &SecretString::from("uE5rT2yI8oP3aS6dF9gH1jK4lZ7xC0vN"),
        )
    }

    fn test_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(7),
            username: "budi".to_string(),
            email: Email::parse("budi@example.com").unwrap(),
            role: Role::Customer,
            address: None,
            city: None,
            post_code: None,
            phone_number: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let user = test_user();

        let token = tokens.issue_access_token(&user).unwrap();
        let claims = tokens.verify_access_token(&token).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "budi");
        assert_eq!(claims.email.as_str(), "budi@example.com");
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let tokens = service();

        let token = tokens.issue_refresh_token(UserId::new(7)).unwrap();
        let claims = tokens.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.user_id, UserId::new(7));
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_access_claims_on_the_wire_are_camel_case() {
        let user = test_user();
        let claims = AccessClaims {
            user_id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["userId"], 7);
        assert_eq!(json["role"], "CUSTOMER");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn test_expired_access_token_is_rejected_as_expired() {
        let tokens = service();
        let user = test_user();
        // Well past the default 60 second validation leeway.
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            user_id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &tokens.access_encoding).unwrap();

        assert!(matches!(
            tokens.verify_access_token(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected_as_invalid() {
        let tokens = service();
        let other = TokenService::new(
            &SecretString::from("Qm4xV7bN2zL9cK5jH8gF3dS6aP1oI0uY"),
            &SecretString::from("Wt6yU3iO9pA2sD5fG8hJ1kL4zX7cV0bM"),
        );
        let user = test_user();

        let token = other.issue_access_token(&user).unwrap();

        assert!(matches!(
            tokens.verify_access_token(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_refresh_token_is_not_a_valid_access_token() {
        let tokens = service();

        let refresh = tokens.issue_refresh_token(UserId::new(7)).unwrap();

        assert!(matches!(
            tokens.verify_access_token(&refresh),
            Err(TokenError::Invalid)
        ));
    }
}
