//! Data models for the lending server

pub mod author;
pub mod book;
pub mod borrower;
pub mod catalogue;
pub mod loan;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails, BookId};
pub use borrower::{BorrowerId, Role};
pub use catalogue::{Catalogue, CatalogueState};
pub use loan::{Loan, LoanDetails, OutstandingBook};
