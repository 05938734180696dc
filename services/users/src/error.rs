//! Custom error types for the users service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, PasswordError};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::repositories::RepositoryError;

/// Errors returned by the user service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Input failed validation
    #[error("{0}")]
    Validation(String),

    /// Email already belongs to another user
    #[error("email already in use")]
    Conflict,

    /// No user with this id
    #[error("user {0} not found")]
    NotFound(i64),

    /// Storage failure
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<RepositoryError> for ServiceError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::DuplicateEmail => ServiceError::Conflict,
            RepositoryError::NotFound(id) => ServiceError::NotFound(id),
            RepositoryError::Database(e) => ServiceError::Database(e),
        }
    }
}

/// Type alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;

/// HTTP-facing error; every variant renders a generic JSON body
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Duplicate email
    #[error("Conflict")]
    Conflict,

    /// Unknown user
    #[error("Not found")]
    NotFound,

    /// Dependency unavailable
    #[error("Service unavailable")]
    ServiceUnavailable,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => ApiError::BadRequest(msg),
            ServiceError::Conflict => ApiError::Conflict,
            ServiceError::NotFound(_) => ApiError::NotFound,
            other => {
                error!("Internal service failure: {}", other);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid JSON body".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        warn!("Rejected path parameter: {}", rejection.body_text());
        ApiError::BadRequest("Invalid user id".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict => (StatusCode::CONFLICT, "Email already in use".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            ApiError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service unavailable".to_string(),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"users\""),
            );
        }

        response
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict, StatusCode::CONFLICT),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (ApiError::InternalServerError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_unauthorized_challenges_for_basic() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"users\""
        );
    }

    #[test]
    fn test_service_errors_do_not_leak_details() {
        let internal = ServiceError::Password(PasswordError::Hash("argon2 exploded".into()));
        assert!(matches!(
            ApiError::from(internal),
            ApiError::InternalServerError
        ));
        assert!(matches!(
            ApiError::from(ServiceError::NotFound(3)),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(ServiceError::from(RepositoryError::DuplicateEmail)),
            ApiError::Conflict
        ));
    }
}
