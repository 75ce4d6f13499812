/// Error types for engagement-service
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::repository::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Target user/post/comment does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed identifier or request parameter, rejected before the store is touched
    #[error("Validation error: {0}")]
    Validation(String),

    /// The document store failed; never retried here
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Store internals stay in the logs
        let message = match self {
            ServiceError::Store(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
