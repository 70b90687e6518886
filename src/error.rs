use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::models::booking::RideStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid ride transition from {from} to {to}")]
    InvalidTransition { from: RideStatus, to: RideStatus },

    /// Carries a provider-style code such as `auth/user-not-found`.
    #[error("auth error: {0}")]
    Auth(String),

    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn auth(code: &str) -> Self {
        AppError::Auth(code.to_string())
    }
}

/// Maps an authentication error code to a message that is safe to show users.
pub fn sanitize_auth_error(code: &str) -> &'static str {
    match code {
        "auth/user-not-found" | "auth/wrong-password" | "auth/invalid-credential" => {
            "Invalid email or password."
        }
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/invalid-email" => "Please enter a valid email address.",
        "auth/weak-password" => "Password should be at least 6 characters.",
        "auth/too-many-requests" => "Too many attempts. Please try again later.",
        "auth/network-request-failed" => "Network error. Check your connection and try again.",
        "auth/missing-session" => "Please sign in to continue.",
        "auth/forbidden" => "You do not have permission to perform this action.",
        _ => "Something went wrong. Please try again.",
    }
}

fn auth_status(code: &str) -> StatusCode {
    match code {
        "auth/email-already-in-use" => StatusCode::CONFLICT,
        "auth/invalid-email" | "auth/weak-password" => StatusCode::BAD_REQUEST,
        "auth/too-many-requests" => StatusCode::TOO_MANY_REQUESTS,
        "auth/forbidden" => StatusCode::FORBIDDEN,
        _ => StatusCode::UNAUTHORIZED,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::Auth(code) => (auth_status(code), sanitize_auth_error(code).to_string()),
            AppError::Upstream { status, message } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                message.clone(),
            ),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_auth_error;

    #[test]
    fn credential_codes_share_one_message() {
        let expected = "Invalid email or password.";
        assert_eq!(sanitize_auth_error("auth/user-not-found"), expected);
        assert_eq!(sanitize_auth_error("auth/wrong-password"), expected);
        assert_eq!(sanitize_auth_error("auth/invalid-credential"), expected);
    }

    #[test]
    fn unknown_codes_do_not_leak_provider_details() {
        let message = sanitize_auth_error("auth/internal-error: quota exceeded for project x");
        assert_eq!(message, "Something went wrong. Please try again.");
    }
}
