//! Catalogue state: the persisted document and its validated in-memory form

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::author::Author;
use super::book::{Book, BookId};
use super::borrower::BorrowerId;
use super::loan::Loan;
use crate::error::{AppError, AppResult, StoreError};

/// Version written into every saved document
pub const SCHEMA_VERSION: u32 = 1;

/// Everything a persistence adapter loads and saves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueState {
    pub version: u32,
    /// Highest author id ever assigned; ids are never reused
    #[serde(default)]
    pub last_author_id: u32,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub books: Vec<Book>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

impl Default for CatalogueState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            last_author_id: 0,
            authors: Vec::new(),
            books: Vec::new(),
            loans: Vec::new(),
        }
    }
}

/// Book record written by the older flat-file programs.
///
/// Two shapes exist. `book_id`/`quantity`/`borrowed` holds the total and the
/// borrowed count. `id`/`available_copies` holds only the copies on the
/// shelf; the copies out on loan are listed by borrower name in a separate
/// [`LegacyBorrowers`] map.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBook {
    #[serde(alias = "book_id", deserialize_with = "legacy_id")]
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub available_copies: Option<u32>,
    #[serde(default)]
    pub borrowed: u32,
}

/// Borrower names per legacy book id, one entry per lent copy
pub type LegacyBorrowers = IndexMap<String, Vec<String>>;

/// Legacy ids were written as strings or integers
fn legacy_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

fn legacy_borrower(name: String) -> BorrowerId {
    if name.trim().is_empty() {
        BorrowerId::anonymous()
    } else {
        BorrowerId(name)
    }
}

impl CatalogueState {
    /// Migrate a legacy flat book list and its borrower map.
    ///
    /// Every lent copy becomes a loan, named when the borrower map knows the
    /// borrower and anonymous otherwise. Records without copies are dropped,
    /// as are borrower entries for books that no longer exist.
    pub fn from_legacy(
        records: Vec<LegacyBook>,
        mut borrowers: LegacyBorrowers,
        migrated_at: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let mut state = CatalogueState::default();
        for record in records {
            let names = borrowers.shift_remove(&record.id).unwrap_or_default();
            let id = BookId(record.id);

            let (total, holders) = match (record.quantity, record.available_copies) {
                (Some(total), _) => {
                    if record.borrowed > total {
                        return Err(StoreError::Schema(format!(
                            "legacy book '{}' has {} borrowed of {} copies",
                            id, record.borrowed, total
                        )));
                    }
                    // named holders first, the rest of the count is anonymous
                    let mut holders: Vec<BorrowerId> = names
                        .into_iter()
                        .take(record.borrowed as usize)
                        .map(legacy_borrower)
                        .collect();
                    holders.resize(record.borrowed as usize, BorrowerId::anonymous());
                    (total, holders)
                }
                (None, Some(available)) => {
                    let holders: Vec<BorrowerId> =
                        names.into_iter().map(legacy_borrower).collect();
                    let lent = u32::try_from(holders.len()).map_err(|_| {
                        StoreError::Schema(format!("too many loans of legacy book '{}'", id))
                    })?;
                    let total = available.checked_add(lent).ok_or_else(|| {
                        StoreError::Schema(format!("copy count of legacy book '{}' overflows", id))
                    })?;
                    (total, holders)
                }
                (None, None) => {
                    return Err(StoreError::Schema(format!(
                        "legacy book '{}' has neither quantity nor available_copies",
                        id
                    )));
                }
            };

            if total == 0 {
                continue;
            }
            let borrowed = holders.len() as u32;
            for holder in holders {
                state.loans.push(Loan::new(id.clone(), holder, migrated_at));
            }
            state.books.push(Book {
                id,
                title: record.title,
                author: record.author,
                author_id: None,
                total,
                borrowed,
            });
        }

        for (book_id, names) in borrowers {
            tracing::warn!(
                book_id = %book_id,
                loans = names.len(),
                "Dropping legacy loans of a book missing from the catalogue"
            );
        }
        Ok(state)
    }
}

/// Validated, in-memory catalogue with its loan ledger.
///
/// Books keep insertion order; loans are kept oldest first.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    books: IndexMap<BookId, Book>,
    authors: IndexMap<u32, Author>,
    last_author_id: u32,
    loans: Vec<Loan>,
}

impl Catalogue {
    /// Build from a loaded document, rejecting anything that breaks the
    /// catalogue invariants.
    pub fn from_state(state: CatalogueState) -> Result<Self, StoreError> {
        if state.version != SCHEMA_VERSION {
            return Err(StoreError::Schema(format!(
                "unsupported schema version {}",
                state.version
            )));
        }

        let mut authors = IndexMap::with_capacity(state.authors.len());
        for author in state.authors {
            if let Some(dup) = authors.insert(author.id, author) {
                return Err(StoreError::Schema(format!("duplicate author id {}", dup.id)));
            }
        }

        let mut books = IndexMap::with_capacity(state.books.len());
        for book in state.books {
            if book.id.as_str().is_empty() {
                return Err(StoreError::Schema("empty book id".to_string()));
            }
            if book.total == 0 {
                return Err(StoreError::Schema(format!("book '{}' has no copies", book.id)));
            }
            if book.borrowed > book.total {
                return Err(StoreError::Schema(format!(
                    "book '{}' has {} borrowed of {} copies",
                    book.id, book.borrowed, book.total
                )));
            }
            if let Some(author_id) = book.author_id {
                if !authors.contains_key(&author_id) {
                    return Err(StoreError::Schema(format!(
                        "book '{}' references unknown author {}",
                        book.id, author_id
                    )));
                }
            }
            if let Some(dup) = books.insert(book.id.clone(), book) {
                return Err(StoreError::Schema(format!("duplicate book id '{}'", dup.id)));
            }
        }

        let mut per_book: HashMap<&BookId, u32> = HashMap::new();
        let mut loan_ids = HashSet::new();
        for loan in &state.loans {
            if !books.contains_key(&loan.book_id) {
                return Err(StoreError::Schema(format!(
                    "loan {} references unknown book '{}'",
                    loan.id, loan.book_id
                )));
            }
            if !loan_ids.insert(loan.id) {
                return Err(StoreError::Schema(format!("duplicate loan id {}", loan.id)));
            }
            *per_book.entry(&loan.book_id).or_default() += 1;
        }
        for book in books.values() {
            let recorded = per_book.get(&book.id).copied().unwrap_or(0);
            if recorded != book.borrowed {
                return Err(StoreError::Schema(format!(
                    "book '{}' has borrowed={} but {} loan records",
                    book.id, book.borrowed, recorded
                )));
            }
        }

        let mut loans = state.loans;
        loans.sort_by_key(|loan| loan.created_at);

        let last_author_id = authors
            .keys()
            .copied()
            .max()
            .map_or(state.last_author_id, |id| id.max(state.last_author_id));

        Ok(Self {
            books,
            authors,
            last_author_id,
            loans,
        })
    }

    pub fn to_state(&self) -> CatalogueState {
        CatalogueState {
            version: SCHEMA_VERSION,
            last_author_id: self.last_author_id,
            authors: self.authors.values().cloned().collect(),
            books: self.books.values().cloned().collect(),
            loans: self.loans.clone(),
        }
    }

    pub fn book(&self, id: &BookId) -> AppResult<&Book> {
        self.books
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Book '{}' not found", id)))
    }

    pub(crate) fn book_mut(&mut self, id: &BookId) -> AppResult<&mut Book> {
        self.books
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Book '{}' not found", id)))
    }

    /// Books in catalogue order
    pub fn books(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn contains_book(&self, id: &BookId) -> bool {
        self.books.contains_key(id)
    }

    pub(crate) fn insert_book(&mut self, book: Book) {
        self.books.insert(book.id.clone(), book);
    }

    /// Remove a record, keeping the order of the rest
    pub(crate) fn remove_book(&mut self, id: &BookId) -> Option<Book> {
        self.books.shift_remove(id)
    }

    pub fn author(&self, id: u32) -> AppResult<&Author> {
        self.authors
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author {} not found", id)))
    }

    pub fn authors(&self) -> impl Iterator<Item = &Author> {
        self.authors.values()
    }

    pub(crate) fn next_author_id(&self) -> AppResult<u32> {
        self.last_author_id
            .checked_add(1)
            .ok_or_else(|| AppError::Conflict("author ids exhausted".to_string()))
    }

    pub(crate) fn insert_author(&mut self, author: Author) {
        self.last_author_id = self.last_author_id.max(author.id);
        self.authors.insert(author.id, author);
    }

    pub(crate) fn remove_author(&mut self, id: u32) -> Option<Author> {
        self.authors.shift_remove(&id)
    }

    pub fn books_by_author(&self, author_id: u32) -> usize {
        self.books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .count()
    }

    /// Outstanding loans, oldest first
    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn loans_of_book<'a>(&'a self, id: &'a BookId) -> impl Iterator<Item = &'a Loan> + 'a {
        self.loans.iter().filter(move |l| l.book_id == *id)
    }

    pub(crate) fn push_loan(&mut self, loan: Loan) {
        self.loans.push(loan);
    }

    /// Detach up to `count` of the oldest loans of a book, optionally
    /// restricted to one borrower.
    pub(crate) fn take_loans(
        &mut self,
        book_id: &BookId,
        borrower: Option<&BorrowerId>,
        count: u32,
    ) -> Vec<Loan> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.loans.len());
        for loan in std::mem::take(&mut self.loans) {
            let wanted = taken.len() < count as usize
                && loan.book_id == *book_id
                && borrower.map_or(true, |b| loan.borrower == *b);
            if wanted {
                taken.push(loan);
            } else {
                kept.push(loan);
            }
        }
        self.loans = kept;
        taken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: &str, total: u32, borrowed: u32) -> Book {
        Book {
            id: BookId::from(id),
            title: format!("Title {}", id),
            author: "Someone".to_string(),
            author_id: None,
            total,
            borrowed,
        }
    }

    #[test]
    fn test_from_state_keeps_order() {
        let state = CatalogueState {
            books: vec![book("c", 1, 0), book("a", 1, 0), book("b", 1, 0)],
            ..Default::default()
        };
        let catalogue = Catalogue::from_state(state).unwrap();
        let ids: Vec<_> = catalogue.books().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_from_state_rejects_over_borrowed() {
        let state = CatalogueState {
            books: vec![book("a", 1, 2)],
            ..Default::default()
        };
        assert!(matches!(
            Catalogue::from_state(state),
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn test_from_state_rejects_loan_count_mismatch() {
        let state = CatalogueState {
            books: vec![book("a", 2, 1)],
            ..Default::default()
        };
        assert!(matches!(
            Catalogue::from_state(state),
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn test_from_state_rejects_duplicates_and_dangling_refs() {
        let dup = CatalogueState {
            books: vec![book("a", 1, 0), book("a", 2, 0)],
            ..Default::default()
        };
        assert!(Catalogue::from_state(dup).is_err());

        let mut linked = book("a", 1, 0);
        linked.author_id = Some(7);
        let dangling = CatalogueState {
            books: vec![linked],
            ..Default::default()
        };
        assert!(Catalogue::from_state(dangling).is_err());

        let stray_loan = CatalogueState {
            loans: vec![Loan::new(BookId::from("ghost"), BorrowerId::from("ann"), Utc::now())],
            ..Default::default()
        };
        assert!(Catalogue::from_state(stray_loan).is_err());
    }

    #[test]
    fn test_from_state_rejects_unknown_version() {
        let state = CatalogueState {
            version: 99,
            ..Default::default()
        };
        assert!(Catalogue::from_state(state).is_err());
    }

    #[test]
    fn test_legacy_migration_of_counted_records() {
        let records: Vec<LegacyBook> = serde_json::from_str(
            r#"[
                {"book_id": "1", "title": "Dune", "author": "Herbert", "quantity": 3, "borrowed": 2},
                {"book_id": 2, "title": "Emma", "author": "Austen", "quantity": 4},
                {"book_id": "3", "title": "Gone", "author": "Nobody", "quantity": 0}
            ]"#,
        )
        .unwrap();
        let state = CatalogueState::from_legacy(records, LegacyBorrowers::new(), Utc::now()).unwrap();
        assert_eq!(state.books.len(), 2);
        assert_eq!((state.books[0].total, state.books[0].borrowed), (3, 2));
        assert_eq!(state.books[1].id, BookId::from("2"));
        assert_eq!((state.books[1].total, state.books[1].borrowed), (4, 0));
        assert_eq!(state.loans.len(), 2);
        assert!(state.loans.iter().all(|l| l.borrower.as_str() == BorrowerId::ANONYMOUS));

        let catalogue = Catalogue::from_state(state).unwrap();
        assert_eq!(catalogue.loans_of_book(&BookId::from("1")).count(), 2);
    }

    #[test]
    fn test_legacy_migration_keeps_lent_copies_and_borrowers() {
        let records: Vec<LegacyBook> = serde_json::from_str(
            r#"[
                {"id": "1", "title": "Dune", "author": "Herbert", "available_copies": 2},
                {"id": "2", "title": "Emma", "author": "Austen", "available_copies": 0},
                {"id": "3", "title": "Gone", "author": "Nobody", "available_copies": 0}
            ]"#,
        )
        .unwrap();
        let borrowers: LegacyBorrowers = serde_json::from_str(
            r#"{"1": ["alice"], "2": ["bob", "carol"], "3": [], "9": ["ghost"]}"#,
        )
        .unwrap();

        let state = CatalogueState::from_legacy(records, borrowers, Utc::now()).unwrap();
        assert_eq!(state.books.len(), 2);
        assert_eq!((state.books[0].total, state.books[0].borrowed), (3, 1));
        assert_eq!((state.books[1].total, state.books[1].borrowed), (2, 2));

        let catalogue = Catalogue::from_state(state).unwrap();
        let dune_id = BookId::from("1");
        let dune: Vec<_> = catalogue
            .loans_of_book(&dune_id)
            .map(|l| l.borrower.as_str())
            .collect();
        assert_eq!(dune, vec!["alice"]);
        let emma_id = BookId::from("2");
        let emma: Vec<_> = catalogue
            .loans_of_book(&emma_id)
            .map(|l| l.borrower.as_str())
            .collect();
        assert_eq!(emma, vec!["bob", "carol"]);
        assert_eq!(catalogue.loans().len(), 3);
    }

    #[test]
    fn test_legacy_record_without_counts_is_rejected() {
        let records: Vec<LegacyBook> =
            serde_json::from_str(r#"[{"id": "1", "title": "Dune", "author": "Herbert"}]"#).unwrap();
        assert!(matches!(
            CatalogueState::from_legacy(records, LegacyBorrowers::new(), Utc::now()),
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn test_author_ids_are_not_reused() {
        let mut catalogue = Catalogue::default();
        for name in ["Mary Shelley", "Bram Stoker"] {
            let id = catalogue.next_author_id().unwrap();
            catalogue.insert_author(Author {
                id,
                name: name.to_string(),
                bio: None,
            });
        }
        catalogue.remove_author(2);
        assert_eq!(catalogue.next_author_id().unwrap(), 3);

        let reloaded = Catalogue::from_state(catalogue.to_state()).unwrap();
        assert_eq!(reloaded.next_author_id().unwrap(), 3);

        // documents written before the counter existed
        let older = CatalogueState {
            authors: vec![Author {
                id: 4,
                name: "Someone".to_string(),
                bio: None,
            }],
            ..Default::default()
        };
        assert_eq!(Catalogue::from_state(older).unwrap().next_author_id().unwrap(), 5);
    }

    #[test]
    fn test_take_loans_oldest_first_for_borrower() {
        let a = BookId::from("a");
        let mut catalogue = Catalogue::default();
        catalogue.insert_book(book("a", 3, 3));
        let t0 = Utc::now();
        catalogue.push_loan(Loan::new(a.clone(), BorrowerId::from("ann"), t0));
        catalogue.push_loan(Loan::new(a.clone(), BorrowerId::from("bob"), t0));
        catalogue.push_loan(Loan::new(a.clone(), BorrowerId::from("ann"), t0));

        let first_ann = catalogue.loans()[0].id;
        let taken = catalogue.take_loans(&a, Some(&BorrowerId::from("ann")), 1);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].id, first_ann);
        assert_eq!(catalogue.loans().len(), 2);

        let rest = catalogue.take_loans(&a, None, 5);
        assert_eq!(rest.len(), 2);
        assert!(catalogue.loans().is_empty());
    }
}
