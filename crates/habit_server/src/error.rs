//! Mapping from service errors to HTTP responses.
//!
//! # Invariants
//! - Every error body is `{"error": "<message>"}`.
//! - Store failures are logged in full and answered with a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use habit_core::HabitServiceError;
use log::error;
use serde_json::json;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(reason: impl Display) -> Self {
        Self::new(StatusCode::BAD_REQUEST, format!("Bad Request: {reason}"))
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn api_route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "API route not found")
    }

    /// Logs `err` and hides it behind a generic message.
    pub fn internal(err: impl Display) -> Self {
        error!("event=request_failed module=http status=error error={err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<HabitServiceError> for ApiError {
    fn from(value: HabitServiceError) -> Self {
        match value {
            HabitServiceError::Validation(err) => Self::bad_request(err),
            HabitServiceError::InvalidId(_) => Self::bad_request("invalid id"),
            HabitServiceError::NotFound(_) => Self::not_found(),
            HabitServiceError::Store(err) => Self::internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use habit_core::{HabitId, HabitServiceError, HabitValidationError, RepoError};

    #[test]
    fn service_errors_map_to_status_and_message() {
        let err = ApiError::from(HabitServiceError::Validation(
            HabitValidationError::MissingTitle,
        ));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Bad Request: missing title");

        let err = ApiError::from(HabitServiceError::InvalidId("123".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Bad Request: invalid id");

        let err = ApiError::from(HabitServiceError::NotFound(HabitId::generate()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "Not Found");
    }

    #[test]
    fn store_errors_do_not_leak_details() {
        let err = ApiError::from(HabitServiceError::Store(RepoError::InvalidData(
            "secret table layout".to_string(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Internal Server Error");
    }
}
