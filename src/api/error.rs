//! Mapping of domain errors onto HTTP responses

use crate::error::{ErrorKind, ServiceDeskError};
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON error body
///
/// ```json
/// { "code": "FORBIDDEN", "message": "...", "suggestions": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                suggestions: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }
}

const fn status_and_code(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::RoleMismatch => (StatusCode::UNPROCESSABLE_ENTITY, "ROLE_MISMATCH"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
        ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl From<ServiceDeskError> for ApiError {
    fn from(error: ServiceDeskError) -> Self {
        let (status, code) = status_and_code(error.kind());
        if status.is_server_error() {
            tracing::error!("Request failed: {error}");
            // Internal details stay in the log
            return Self::new(status, code, "Internal server error");
        }

        Self {
            status,
            body: ErrorBody {
                code,
                message: error.user_message(),
                suggestions: error.suggestions(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceDeskError::validation(format!("Invalid request body: {}", rejection.body_text()))
            .into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ServiceDeskError::validation(format!("Invalid query string: {}", rejection.body_text()))
            .into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceDeskError::validation("x"), StatusCode::BAD_REQUEST),
            (ServiceDeskError::not_found("Ticket", "1"), StatusCode::NOT_FOUND),
            (ServiceDeskError::forbidden("no"), StatusCode::FORBIDDEN),
            (
                ServiceDeskError::RoleMismatch {
                    user: "u".into(),
                    expected: "TECHNICIAN".into(),
                    actual: "STAFF".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ServiceDeskError::Conflict {
                    id: "t".into(),
                    expected: 0,
                    found: 1,
                },
                StatusCode::CONFLICT,
            ),
            (ServiceDeskError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                ServiceDeskError::Storage("disk".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status, expected);
        }
    }

    #[test]
    fn test_internal_details_hidden() {
        let api = ApiError::from(ServiceDeskError::Storage("/secret/path".into()));
        assert!(!api.body.message.contains("secret"));
    }
}
