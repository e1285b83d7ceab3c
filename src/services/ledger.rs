//! Lending ledger service: borrow, return and outstanding loans

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookDetails, BookId, BorrowerId, Catalogue, Loan, LoanDetails, OutstandingBook},
};

use super::library::Library;

#[derive(Clone)]
pub struct LedgerService {
    library: Arc<Library>,
}

/// Snapshot of every book with copies out.
///
/// Iteration is lazy and can be repeated; it always reflects the state at
/// the time the snapshot was taken.
pub struct Outstanding {
    catalogue: Arc<Catalogue>,
}

impl Outstanding {
    pub fn iter(&self) -> impl Iterator<Item = (&Book, Vec<&BorrowerId>)> + '_ {
        let catalogue: &Catalogue = &self.catalogue;
        catalogue
            .books()
            .filter(|book| book.borrowed > 0)
            .map(move |book| {
                let borrowers = catalogue
                    .loans_of_book(&book.id)
                    .map(|loan| &loan.borrower)
                    .collect();
                (book, borrowers)
            })
    }

    pub fn to_vec(&self) -> Vec<OutstandingBook> {
        self.iter()
            .map(|(book, borrowers)| OutstandingBook {
                book: BookDetails::from(book),
                borrowers: borrowers.into_iter().cloned().collect(),
            })
            .collect()
    }
}

fn check_count(count: u32) -> AppResult<()> {
    if count == 0 {
        return Err(AppError::InvalidQuantity("count must be positive".to_string()));
    }
    Ok(())
}

fn check_borrower(borrower: &BorrowerId) -> AppResult<()> {
    if borrower.as_str().trim().is_empty() {
        return Err(AppError::Validation("borrower must not be empty".to_string()));
    }
    Ok(())
}

impl LedgerService {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// Lend `count` copies to `borrower`, one loan record per copy
    pub async fn borrow(&self, id: &BookId, borrower: &BorrowerId, count: u32) -> AppResult<BookDetails> {
        check_count(count)?;
        check_borrower(borrower)?;

        let book = self
            .library
            .transact("borrow", |catalogue| {
                let book = catalogue.book_mut(id)?;
                let available = book.available();
                if available < count {
                    return Err(AppError::NotAvailable {
                        book_id: id.clone(),
                        requested: count,
                        available,
                    });
                }
                book.borrowed += count;
                let details = BookDetails::from(&*book);

                let now = Utc::now();
                for _ in 0..count {
                    catalogue.push_loan(Loan::new(id.clone(), borrower.clone(), now));
                }
                Ok(details)
            })
            .await?;

        tracing::info!(
            book_id = %id,
            borrower = %borrower,
            count,
            borrowed = book.borrowed,
            total = book.total,
            "Book borrowed"
        );
        Ok(book)
    }

    /// Take back up to `count` copies lent to `borrower`, oldest loans first
    pub async fn return_copies(
        &self,
        id: &BookId,
        borrower: &BorrowerId,
        count: u32,
    ) -> AppResult<BookDetails> {
        check_count(count)?;
        check_borrower(borrower)?;
        self.release(id, Some(borrower), count).await
    }

    /// Take back up to `count` of the oldest loans of a book, whoever holds them
    pub async fn return_any(&self, id: &BookId, count: u32) -> AppResult<BookDetails> {
        check_count(count)?;
        self.release(id, None, count).await
    }

    async fn release(
        &self,
        id: &BookId,
        borrower: Option<&BorrowerId>,
        count: u32,
    ) -> AppResult<BookDetails> {
        let (book, released) = self
            .library
            .transact("return", |catalogue| {
                catalogue.book(id)?;
                let loans = catalogue.take_loans(id, borrower, count);
                if loans.is_empty() {
                    return Err(AppError::NoSuchLoan {
                        book_id: id.clone(),
                        borrower: borrower.cloned(),
                    });
                }
                let released = loans.len() as u32;
                let book = catalogue.book_mut(id)?;
                book.borrowed -= released;
                Ok((BookDetails::from(&*book), released))
            })
            .await?;

        tracing::info!(
            book_id = %id,
            borrower = borrower.map(|b| b.as_str()).unwrap_or("*"),
            count = released,
            borrowed = book.borrowed,
            "Book returned"
        );
        Ok(book)
    }

    /// Books with copies out, and their borrowers
    pub async fn list_outstanding(&self) -> Outstanding {
        Outstanding {
            catalogue: self.library.snapshot().await,
        }
    }

    /// A borrower's outstanding loans, oldest first
    pub async fn loans_for(&self, borrower: &BorrowerId) -> Vec<LoanDetails> {
        let catalogue = self.library.snapshot().await;
        catalogue
            .loans()
            .iter()
            .filter(|loan| loan.borrower == *borrower)
            .filter_map(|loan| {
                let book = catalogue.book(&loan.book_id).ok()?;
                Some(LoanDetails {
                    id: loan.id,
                    created_at: loan.created_at,
                    borrower: loan.borrower.clone(),
                    book: BookDetails::from(book),
                })
            })
            .collect()
    }
}
