//! Helper types and traits for cleaner route handlers.
//!
//! Every failure leaves a handler as an `ApiError`, which renders as
//! `{"error": "<message>"}` with the matching status code. The extension
//! traits convert `Option` and `Result` values into `ApiError`s in place.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use book_translator_core::{Error, ErrorKind};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

/// Standard result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err.kind() {
            // A running job is reported as a bad request, not 409
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream | ErrorKind::Internal => {
                error!("Request failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Extension trait for converting `Option<T>` to `ApiResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> ApiResult<T>;

    /// Returns the contained value or a 400 Bad Request error.
    fn or_bad_request(self, msg: &str) -> ApiResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> ApiResult<T> {
        self.ok_or_else(|| ApiError::not_found(msg))
    }

    fn or_bad_request(self, msg: &str) -> ApiResult<T> {
        self.ok_or_else(|| ApiError::bad_request(msg))
    }
}

/// Extension trait for converting `Result<T, E>` to `ApiResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> ApiResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_bad_request(self) -> ApiResult<T> {
        self.map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

pub const BOOK_NOT_FOUND: &str = "Book not found";

/// Parse a book id taken from a path or query.
///
/// A value that is not a UUID cannot name a stored book, so it is reported as
/// 404 like any other unknown id.
pub fn parse_book_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).ok().or_not_found(BOOK_NOT_FOUND)
}

/// Require a non-empty id parameter, then parse it.
pub fn required_book_id(raw: Option<&str>, msg: &str) -> ApiResult<Uuid> {
    let raw = raw.filter(|s| !s.trim().is_empty()).or_bad_request(msg)?;
    parse_book_id(raw)
}
