//! Unified error types for the Symphony core
//!
//! This module defines error types for each layer:
//! - `DomainError`: Core business logic and persistence errors
//! - `ConfigError`: Process configuration errors
//!
//! `DomainError` also implements `IntoResponse` so the API layer can hand it
//! straight back to axum.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Domain layer errors - business rule and persistence failures
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Locked: {0}")]
    Locked(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Business conflicts are not worth retrying; infrastructure failures may be
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Database(_))
    }

    /// Re-label a storage uniqueness conflict as `AlreadyExists`
    pub(crate) fn conflict_as_already_exists(self) -> Self {
        match self {
            DomainError::Conflict(msg) => DomainError::AlreadyExists(msg),
            other => other,
        }
    }
}

/// Classify a SeaORM error.
///
/// Unique violations become `Conflict` and foreign key violations `NotFound`,
/// so callers can tell business conflicts from infrastructure failures.
impl From<DbErr> for DomainError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => DomainError::Conflict(detail),
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                DomainError::NotFound(format!("Referenced entity is missing: {}", detail))
            }
            _ => DomainError::Database(err.to_string()),
        }
    }
}

/// Configuration errors raised while reading the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            DomainError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            DomainError::AlreadyExists(msg) => {
                (StatusCode::CONFLICT, "Already exists", Some(msg.clone()))
            }
            DomainError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            DomainError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "Validation error",
                Some(msg.clone()),
            ),
            DomainError::LimitExceeded(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Limit exceeded",
                Some(msg.clone()),
            ),
            DomainError::Locked(msg) => (StatusCode::LOCKED, "Locked", Some(msg.clone())),
            DomainError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            DomainError::IllegalState(msg) => {
                tracing::error!("Illegal state: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
            DomainError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::LimitExceeded("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (DomainError::Locked("x".into()), StatusCode::LOCKED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                DomainError::IllegalState("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                DomainError::Database("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn generic_db_error_is_retryable() {
        let err: DomainError = DbErr::Custom("connection reset".to_string()).into();
        assert!(matches!(err, DomainError::Database(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn conflict_relabels_as_already_exists() {
        let err = DomainError::Conflict("username".into()).conflict_as_already_exists();
        assert!(matches!(err, DomainError::AlreadyExists(_)));

        let err = DomainError::Locked("vault".into()).conflict_as_already_exists();
        assert!(matches!(err, DomainError::Locked(_)));
    }
}
