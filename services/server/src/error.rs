//! Request error taxonomy for the studio backend

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for request handling
///
/// Every failure a handler can produce maps onto one of these variants;
/// the `IntoResponse` impl decides the status code and makes sure 5xx
/// causes are logged server-side and never leak to the client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// A unique field collided with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No valid session
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authenticated but not permitted
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Resource absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Blob storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unexpected failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl ApiError {
    /// Status code the variant maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Internal(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            ApiError::Validation(msg)
            | ApiError::Conflict(msg)
            | ApiError::Authentication(msg)
            | ApiError::Authorization(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                msg.clone()
            }
            ApiError::Storage(_) => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
            ApiError::Database(_) => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(common::error::DatabaseError::Query(err))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ApiError>() {
            Ok(api_err) => api_err,
            Err(other) => {
                tracing::error!("Unhandled error: {:#}", other);
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

/// Type alias for handler results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::Validation("missing field".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("duplicate".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Authentication("no session".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Authorization("not the owner".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Storage("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_error_response_hides_cause() {
        let response = ApiError::Storage("/var/secret/path denied".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_anyhow_roundtrip_preserves_variant() {
        let err: anyhow::Error = ApiError::NotFound("Photo not found".into()).into();
        let back: ApiError = err.into();
        assert_eq!(back.status_code(), StatusCode::NOT_FOUND);
    }
}
