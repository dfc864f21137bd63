//! Error types for the circulation server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// PostgreSQL SQLSTATE codes the store translates
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_SERIALIZATION_FAILURE: &str = "40001";
const PG_DEADLOCK_DETECTED: &str = "40P01";

/// Stable numeric codes carried in error responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NotFound = 3,
    BookAlreadyBorrowed = 4,
    InvalidBookData = 5,
    DuplicateBorrowerEmail = 6,
    ConcurrencyConflict = 7,
    BadValue = 8,
    LockTimeout = 9,
}

/// Failures reported by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} was modified concurrently")]
    OptimisticConflict { entity: &'static str, id: Uuid },

    #[error("transaction could not be serialized")]
    SerializationFailure,

    #[error("unique constraint {0} violated")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Conflicts are transient: re-running the operation from its reads may succeed
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::OptimisticConflict { .. } | StoreError::SerializationFailure
        )
    }

    /// Whether this is a violation of the named unique constraint
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or_default().to_string();
                    return StoreError::UniqueViolation(constraint);
                }
                Some(PG_SERIALIZATION_FAILURE) | Some(PG_DEADLOCK_DETECTED) => {
                    return StoreError::SerializationFailure;
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Book already borrowed: {0}")]
    BookAlreadyBorrowed(String),

    #[error("Invalid book data: {0}")]
    InvalidBookData(String),

    #[error("Duplicate borrower email: {0}")]
    DuplicateBorrowerEmail(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::BookAlreadyBorrowed(_) => {
                (StatusCode::CONFLICT, ErrorCode::BookAlreadyBorrowed)
            }
            AppError::InvalidBookData(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidBookData),
            AppError::DuplicateBorrowerEmail(_) => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateBorrowerEmail)
            }
            AppError::ConcurrencyConflict(_) => {
                (StatusCode::CONFLICT, ErrorCode::ConcurrencyConflict)
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::LockTimeout(_) => (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::LockTimeout),
            AppError::Store(e) if e.is_conflict() => {
                (StatusCode::CONFLICT, ErrorCode::ConcurrencyConflict)
            }
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::NotFound(msg)
            | AppError::BookAlreadyBorrowed(msg)
            | AppError::InvalidBookData(msg)
            | AppError::DuplicateBorrowerEmail(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::ConcurrencyConflict(msg) => {
                tracing::warn!("Concurrency conflict: {}", msg);
                msg.clone()
            }
            AppError::LockTimeout(msg) => {
                tracing::warn!("Lock timeout: {}", msg);
                msg.clone()
            }
            AppError::Store(e) if e.is_conflict() => e.to_string(),
            AppError::Store(e) => {
                tracing::error!("Storage error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
