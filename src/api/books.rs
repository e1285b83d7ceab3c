//! Catalogue endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::{book::AddBook, loan::CopyCount, BookDetails, BookId},
    AppState,
};

use super::{Admin, CountBody, JsonBody};

/// Search query
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Keyword matched against title and author; empty lists everything
    pub q: Option<String>,
}

/// Result of withdrawing copies
#[derive(Serialize, ToSchema)]
pub struct RemoveCopiesResponse {
    /// Remaining record, absent once the last copy is gone
    pub book: Option<BookDetails>,
    /// Whether the record was deleted
    pub deleted: bool,
}

/// Search the catalogue
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books in catalogue order", body = Vec<BookDetails>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<BookDetails>> {
    let keyword = query.q.unwrap_or_default();
    Json(state.services.catalogue.search(&keyword).await)
}

/// Add a book, or add copies to an existing one
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = AddBook,
    responses(
        (status = 200, description = "Resulting record", body = BookDetails),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    JsonBody(request): JsonBody<AddBook>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalogue.add_or_merge(request).await?;
    Ok(Json(book))
}

/// Get a book by identifier
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDetails>> {
    let book = state.services.catalogue.find(&BookId(id)).await?;
    Ok(Json(book))
}

/// Delete a book record
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies are on loan")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.services.catalogue.remove_all(&BookId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Withdraw some copies of a book
#[utoipa::path(
    post,
    path = "/books/{id}/remove-copies",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body(content = CopyCount, description = "Defaults to one copy"),
    responses(
        (status = 200, description = "Copies withdrawn", body = RemoveCopiesResponse),
        (status = 400, description = "Invalid count, or more than the number of copies"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies are on loan")
    )
)]
pub async fn remove_copies(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    Path(id): Path<String>,
    CountBody(count): CountBody,
) -> AppResult<Json<RemoveCopiesResponse>> {
    let book = state
        .services
        .catalogue
        .remove_partial(&BookId(id), count)
        .await?;
    Ok(Json(RemoveCopiesResponse {
        deleted: book.is_none(),
        book,
    }))
}
