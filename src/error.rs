//! Error types for the lending server

use thiserror::Error;

use crate::models::{book::BookId, borrower::BorrowerId};

/// Failure of a persistence adapter
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid catalogue document: {0}")]
    Schema(String),
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Book '{book_id}' is not available: requested {requested}, available {available}")]
    NotAvailable {
        book_id: BookId,
        requested: u32,
        available: u32,
    },

    #[error("No outstanding loan of book '{book_id}'{}", loan_holder(.borrower))]
    NoSuchLoan {
        book_id: BookId,
        /// `None` when the return was not restricted to one borrower
        borrower: Option<BorrowerId>,
    },

    #[error("Book '{book_id}' has {borrowed} copies on loan")]
    HasOutstandingLoans { book_id: BookId, borrowed: u32 },

    #[error("Author {author_id} still has {books} associated books")]
    AuthorHasBooks { author_id: u32, books: usize },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

fn loan_holder(borrower: &Option<BorrowerId>) -> String {
    match borrower {
        Some(borrower) => format!(" for '{}'", borrower),
        None => String::new(),
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
