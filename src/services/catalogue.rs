//! Catalogue management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{book::AddBook, Book, BookDetails, BookId},
};

use super::library::Library;

#[derive(Clone)]
pub struct CatalogueService {
    library: Arc<Library>,
}

impl CatalogueService {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// Add a new book, or add copies to an existing one.
    ///
    /// An existing record keeps its title and author.
    pub async fn add_or_merge(&self, request: AddBook) -> AppResult<BookDetails> {
        request.validate()?;
        if request.copies == 0 {
            return Err(AppError::InvalidQuantity("copies must be positive".to_string()));
        }
        let id = BookId(request.id.clone());

        let book = self
            .library
            .transact("add_or_merge", move |catalogue| {
                if catalogue.contains_book(&id) {
                    let book = catalogue.book_mut(&id)?;
                    book.total = book.total.checked_add(request.copies).ok_or_else(|| {
                        AppError::InvalidQuantity(format!(
                            "adding {} copies to book '{}' overflows",
                            request.copies, id
                        ))
                    })?;
                    return Ok(BookDetails::from(&*book));
                }

                let author = match request.author_id {
                    Some(author_id) => catalogue.author(author_id)?.name.clone(),
                    None => request.author,
                };
                if request.title.trim().is_empty() {
                    return Err(AppError::Validation("title must not be empty".to_string()));
                }
                if author.trim().is_empty() {
                    return Err(AppError::Validation("author must not be empty".to_string()));
                }

                let book = Book {
                    id,
                    title: request.title,
                    author,
                    author_id: request.author_id,
                    total: request.copies,
                    borrowed: 0,
                };
                let details = BookDetails::from(&book);
                catalogue.insert_book(book);
                Ok(details)
            })
            .await?;

        tracing::info!(book_id = %book.id, total = book.total, "Book added");
        Ok(book)
    }

    /// Delete a record. Refused while copies are on loan.
    pub async fn remove_all(&self, id: &BookId) -> AppResult<BookDetails> {
        let removed = self
            .library
            .transact("remove_all", |catalogue| {
                let book = catalogue.book(id)?;
                if book.borrowed > 0 {
                    return Err(AppError::HasOutstandingLoans {
                        book_id: id.clone(),
                        borrowed: book.borrowed,
                    });
                }
                let book = catalogue
                    .remove_book(id)
                    .ok_or_else(|| AppError::NotFound(format!("Book '{}' not found", id)))?;
                Ok(BookDetails::from(&book))
            })
            .await?;

        tracing::info!(book_id = %id, "Book removed");
        Ok(removed)
    }

    /// Withdraw `count` copies; the record is deleted when none remain.
    /// Returns the remaining record, if any.
    pub async fn remove_partial(&self, id: &BookId, count: u32) -> AppResult<Option<BookDetails>> {
        let remaining = self
            .library
            .transact("remove_partial", |catalogue| {
                let book = catalogue.book_mut(id)?;
                if count == 0 || count > book.total {
                    return Err(AppError::InvalidQuantity(format!(
                        "cannot remove {} of {} copies of book '{}'",
                        count, book.total, id
                    )));
                }
                if book.total - count < book.borrowed {
                    return Err(AppError::HasOutstandingLoans {
                        book_id: id.clone(),
                        borrowed: book.borrowed,
                    });
                }

                book.total -= count;
                if book.total > 0 {
                    return Ok(Some(BookDetails::from(&*book)));
                }
                catalogue.remove_book(id);
                Ok(None)
            })
            .await?;

        tracing::info!(
            book_id = %id,
            count,
            total = remaining.as_ref().map_or(0, |b| b.total),
            "Copies removed"
        );
        Ok(remaining)
    }

    /// Case-insensitive keyword search on title and author, in catalogue
    /// order. An empty keyword matches everything.
    pub async fn search(&self, keyword: &str) -> Vec<BookDetails> {
        let needle = keyword.to_lowercase();
        self.library
            .snapshot()
            .await
            .books()
            .filter(|book| book.matches(&needle))
            .map(BookDetails::from)
            .collect()
    }

    pub async fn find(&self, id: &BookId) -> AppResult<BookDetails> {
        let catalogue = self.library.snapshot().await;
        catalogue.book(id).map(BookDetails::from)
    }

    /// Every record, in catalogue order
    pub async fn list(&self) -> Vec<BookDetails> {
        self.search("").await
    }
}
