//! Catalogue stored in SQLite tables

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, Pool, Sqlite,
};
use uuid::Uuid;

use super::Store;
use crate::{
    error::StoreError,
    models::{Author, Book, BookId, BorrowerId, CatalogueState, Loan},
};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id   INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        bio  TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id        TEXT PRIMARY KEY,
        position  INTEGER NOT NULL,
        title     TEXT NOT NULL,
        author    TEXT NOT NULL,
        author_id INTEGER REFERENCES authors(id),
        total     INTEGER NOT NULL CHECK (total > 0),
        borrowed  INTEGER NOT NULL CHECK (borrowed >= 0 AND borrowed <= total)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS loans (
        id         TEXT PRIMARY KEY,
        position   INTEGER NOT NULL,
        book_id    TEXT NOT NULL REFERENCES books(id),
        borrower   TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS counters (
        name  TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )
    "#,
];

const LAST_AUTHOR_ID: &str = "last_author_id";

#[derive(FromRow)]
struct AuthorRow {
    id: i64,
    name: String,
    bio: Option<String>,
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    title: String,
    author: String,
    author_id: Option<i64>,
    total: i64,
    borrowed: i64,
}

#[derive(FromRow)]
struct LoanRow {
    id: String,
    book_id: String,
    borrower: String,
    created_at: DateTime<Utc>,
}

fn to_u32(value: i64, what: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Schema(format!("{} out of range: {}", what, value)))
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Connect (creating the database file if needed) and ensure the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Writes are already serialized by the library; one connection also
        // keeps `sqlite::memory:` databases alive across calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn load(&self) -> Result<CatalogueState, StoreError> {
        let authors = sqlx::query_as::<_, AuthorRow>("SELECT id, name, bio FROM authors ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|row| {
                Ok(Author {
                    id: to_u32(row.id, "author id")?,
                    name: row.name,
                    bio: row.bio,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let books = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, author, author_id, total, borrowed FROM books ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| {
            Ok(Book {
                id: BookId(row.id),
                title: row.title,
                author: row.author,
                author_id: row.author_id.map(|id| to_u32(id, "author id")).transpose()?,
                total: to_u32(row.total, "total")?,
                borrowed: to_u32(row.borrowed, "borrowed")?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

        let loans = sqlx::query_as::<_, LoanRow>(
            "SELECT id, book_id, borrower, created_at FROM loans ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| {
            let id = Uuid::parse_str(&row.id)
                .map_err(|e| StoreError::Schema(format!("loan id '{}': {}", row.id, e)))?;
            Ok(Loan {
                id,
                book_id: BookId(row.book_id),
                borrower: BorrowerId(row.borrower),
                created_at: row.created_at,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;

        let last_author_id: Option<i64> =
            sqlx::query_scalar("SELECT value FROM counters WHERE name = $1")
                .bind(LAST_AUTHOR_ID)
                .fetch_optional(&self.pool)
                .await?;
        let last_author_id = to_u32(last_author_id.unwrap_or(0), "last author id")?;

        Ok(CatalogueState {
            last_author_id,
            authors,
            books,
            loans,
            ..Default::default()
        })
    }

    async fn save(&self, state: &CatalogueState) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM loans").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM books").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM authors").execute(&mut *tx).await?;

        for author in &state.authors {
            sqlx::query("INSERT INTO authors (id, name, bio) VALUES ($1, $2, $3)")
                .bind(i64::from(author.id))
                .bind(&author.name)
                .bind(&author.bio)
                .execute(&mut *tx)
                .await?;
        }

        for (position, book) in state.books.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO books (id, position, title, author, author_id, total, borrowed)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(book.id.as_str())
            .bind(position as i64)
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.author_id.map(i64::from))
            .bind(i64::from(book.total))
            .bind(i64::from(book.borrowed))
            .execute(&mut *tx)
            .await?;
        }

        for (position, loan) in state.loans.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO loans (id, position, book_id, borrower, created_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(loan.id.to_string())
            .bind(position as i64)
            .bind(loan.book_id.as_str())
            .bind(loan.borrower.as_str())
            .bind(loan.created_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO counters (name, value) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(LAST_AUTHOR_ID)
        .bind(i64::from(state.last_author_id))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
