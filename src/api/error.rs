//! HTTP mapping of application errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;

/// Stable numeric error codes exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    PersistenceFailure = 3,
    NotFound = 4,
    InvalidQuantity = 5,
    NotAvailable = 6,
    NoSuchLoan = 7,
    HasOutstandingLoans = 8,
    AuthorHasBooks = 9,
    Duplicate = 10,
    BadValue = 11,
}

/// Error response body
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
            AppError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, ErrorCode::InvalidQuantity),
            AppError::NotAvailable { .. } => (StatusCode::CONFLICT, ErrorCode::NotAvailable),
            AppError::NoSuchLoan { .. } => (StatusCode::CONFLICT, ErrorCode::NoSuchLoan),
            AppError::HasOutstandingLoans { .. } => {
                (StatusCode::CONFLICT, ErrorCode::HasOutstandingLoans)
            }
            AppError::AuthorHasBooks { .. } => (StatusCode::CONFLICT, ErrorCode::AuthorHasBooks),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Duplicate),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::PersistenceFailure,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Persistence(e) => {
                tracing::error!("Persistence error: {:?}", e);
                "Storage error, the operation was not applied".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}
