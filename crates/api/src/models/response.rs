//! Response envelope shared by every endpoint.
//!
//! All JSON responses have the shape:
//!
//! ```json
//! { "success": true, "message": "...", "data": { ... } }
//! { "success": false, "message": "...", "errors": [{ "path": "...", "message": "..." }] }
//! ```
//!
//! `data` and `errors` are omitted entirely when absent, never `null`.

use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The offending input field (e.g., `email`, `post_code`).
    pub path: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldError {
    /// Create a field error for `path` with `message`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The uniform response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
    /// Payload, present on successful responses that carry data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Field-level failures, present on validation-style errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Successful response with no payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    /// Failed response with no field detail.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: None,
        }
    }

    /// Failed response with field-level detail.
    pub fn error_with(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors: Some(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let body = ApiResponse::ok("Login Success", serde_json::json!({"accessToken": "abc"}));
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Login Success");
        assert_eq!(json["data"]["accessToken"], "abc");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_message_envelope_omits_data() {
        let body = ApiResponse::message("Register success");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_error_with_field_detail() {
        let body = ApiResponse::error_with(
            "Validation error",
            vec![FieldError::new("email", "Invalid email format")],
        );
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["path"], "email");
        assert_eq!(json["errors"][0]["message"], "Invalid email format");
    }
}
