/// Unified error types for the Ethos API
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum EthosError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Registration is switched off
    #[error("User registration is disabled")]
    RegistrationDisabled,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (e.g., duplicate user, active focus session)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JWT errors
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<validator::ValidationErrors> for EthosError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EthosError::Validation(errors.to_string())
    }
}

impl EthosError {
    /// True when the underlying database error is a unique constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            EthosError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// True when SQLite gave up waiting for another connection's write lock
    pub fn is_busy(&self) -> bool {
        match self {
            EthosError::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                // SQLITE_BUSY and its extended codes
                .map_or(false, |code| code & 0xff == 5),
            _ => false,
        }
    }
}

/// Convert EthosError to HTTP response
impl IntoResponse for EthosError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            EthosError::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                self.to_string(),
            ),
            EthosError::RegistrationDisabled => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                self.to_string(),
            ),
            EthosError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            EthosError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NotFound",
                self.to_string(),
            ),
            EthosError::Conflict(_) => (
                StatusCode::CONFLICT,
                "Conflict",
                self.to_string(),
            ),
            ref internal => {
                tracing::error!(error = %internal, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type EthosResult<T> = Result<T, EthosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EthosError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (EthosError::Authentication("no".into()), StatusCode::UNAUTHORIZED),
            (EthosError::RegistrationDisabled, StatusCode::FORBIDDEN),
            (EthosError::NotFound("goal".into()), StatusCode::NOT_FOUND),
            (EthosError::Conflict("busy".into()), StatusCode::CONFLICT),
            (EthosError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
