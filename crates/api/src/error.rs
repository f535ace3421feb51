//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use registration::RegistrationError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid session token.
    Unauthenticated,
    /// Authenticated identity does not own the requested resource.
    Forbidden(String),
    /// Registration coordinator error.
    Registration(RegistrationError),
    /// Store error.
    Store(StoreError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "authentication required".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Registration(err) => registration_error_to_response(err),
            ApiError::Store(err) => internal(&err),
            ApiError::Internal(msg) => internal(&msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Internal faults are logged for the operator and returned as a generic
/// failure; the raw error never reaches the client.
fn internal(err: &impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!(error = %err, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

fn registration_error_to_response(err: RegistrationError) -> (StatusCode, String) {
    match &err {
        RegistrationError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        RegistrationError::DeleteRace(_) => (StatusCode::CONFLICT, err.to_string()),
        RegistrationError::Store(inner) => internal(inner),
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        ApiError::Registration(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
