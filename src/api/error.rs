use actix_web::{HttpResponse, ResponseError};
use std::fmt;
use tracing::{error, warn};

use super::validation::ErrorResponse;

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Database operation failed
    DatabaseError(sqlx::Error),

    /// Request was well-formed but its content is not acceptable
    ValidationError(String),

    /// Record not found
    NotFound(String),

    /// Unique field already taken
    Conflict(String),

    /// Caller is known but not allowed
    Forbidden(String),

    /// Uploaded file could not be stored
    UploadError(String),

    /// Token could not be issued
    TokenError(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServiceError::UploadError(msg) => write!(f, "Upload error: {}", msg),
            ServiceError::TokenError(msg) => write!(f, "Token error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or("unique field").to_string();
                ServiceError::Conflict(constraint)
            }
            _ => ServiceError::DatabaseError(e),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::DatabaseError(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse::message(
                    "Failed to process request",
                    "Database error occurred",
                ))
            }
            ServiceError::ValidationError(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse::message("Validation failed", msg))
            }
            ServiceError::NotFound(msg) => {
                warn!("Not found: {}", msg);
                HttpResponse::NotFound().json(ErrorResponse::message("Not found", msg))
            }
            ServiceError::Conflict(msg) => {
                warn!("Duplicate key: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse::message("Duplicate key error", msg))
            }
            ServiceError::Forbidden(msg) => {
                warn!("Forbidden: {}", msg);
                HttpResponse::Forbidden().json(ErrorResponse::message("Forbidden", msg))
            }
            ServiceError::UploadError(msg) => {
                error!("Upload error: {}", msg);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::message("Failed to store upload", "File could not be saved"))
            }
            ServiceError::TokenError(msg) => {
                error!("Token error: {}", msg);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::message("Failed to process request", "Token could not be issued"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_their_status_codes() {
        let cases = [
            (ServiceError::ValidationError("bad".into()), 400),
            (ServiceError::NotFound("Job x".into()), 404),
            (ServiceError::Conflict("providers_phone_number_key".into()), 400),
            (ServiceError::Forbidden("suspended".into()), 403),
            (ServiceError::UploadError("disk full".into()), 500),
            (ServiceError::DatabaseError(sqlx::Error::RowNotFound), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.error_response().status().as_u16(), status, "{}", err);
        }
    }

    #[test]
    fn missing_row_is_a_database_error() {
        let err = ServiceError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
