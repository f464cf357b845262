//! Error types for the Circulon server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes carried in every error payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NoSuchData = 3,
    ItemNotAvailable = 4,
    DuplicateLoan = 5,
    MaxBorrowsReached = 6,
    NoActiveLoan = 7,
    BadTransition = 8,
    BadInventoryState = 9,
    Duplicate = 10,
    BadValue = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item unavailable: {0}")]
    ItemUnavailable(String),

    #[error("Duplicate active loan: {0}")]
    DuplicateActiveLoan(String),

    #[error("Borrow limit exceeded: {0}")]
    BorrowLimitExceeded(String),

    #[error("No active loan: {0}")]
    NoActiveLoan(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Invalid inventory state: {0}")]
    InvalidInventoryState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::ItemUnavailable(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ItemNotAvailable, msg.clone())
            }
            AppError::DuplicateActiveLoan(msg) => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateLoan, msg.clone())
            }
            AppError::BorrowLimitExceeded(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::MaxBorrowsReached,
                msg.clone(),
            ),
            AppError::NoActiveLoan(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::NoActiveLoan,
                msg.clone(),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::BadTransition,
                msg.clone(),
            ),
            AppError::InvalidInventoryState(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::BadInventoryState,
                msg.clone(),
            ),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
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
