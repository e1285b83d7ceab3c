//! Loan (one borrowed copy) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::{BookDetails, BookId};
use super::borrower::BorrowerId;

/// One outstanding borrow of one copy. Created by a borrow, destroyed by a
/// return, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub book_id: BookId,
    pub borrower: BorrowerId,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    pub fn new(book_id: BookId, borrower: BorrowerId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            borrower,
            created_at,
        }
    }
}

/// Loan with the borrowed book, for a borrower's history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub borrower: BorrowerId,
    pub book: BookDetails,
}

/// A book with copies out, and who holds them (one entry per copy)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OutstandingBook {
    pub book: BookDetails,
    pub borrowers: Vec<BorrowerId>,
}

/// Copy count for borrow / return / removal requests
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CopyCount {
    #[serde(default = "one")]
    pub count: u32,
}

impl Default for CopyCount {
    fn default() -> Self {
        Self { count: 1 }
    }
}

fn one() -> u32 {
    1
}
