//! Lending endpoints

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{loan::CopyCount, BookDetails, BookId, LoanDetails, OutstandingBook},
    AppState,
};

use super::{Admin, Borrower, CountBody};

/// Borrow copies of a book
#[utoipa::path(
    post,
    path = "/books/{id}/borrow",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body(content = CopyCount, description = "Defaults to one copy"),
    responses(
        (status = 200, description = "Updated record", body = BookDetails),
        (status = 401, description = "Borrower identity missing"),
        (status = 400, description = "Invalid copy count"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Not enough copies available")
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    borrower: Borrower,
    Path(id): Path<String>,
    CountBody(count): CountBody,
) -> AppResult<Json<BookDetails>> {
    let book = state
        .services
        .ledger
        .borrow(&BookId(id), &borrower.id, count)
        .await?;
    Ok(Json(book))
}

/// Return copies borrowed by the caller
#[utoipa::path(
    post,
    path = "/books/{id}/return",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body(content = CopyCount, description = "Defaults to one copy"),
    responses(
        (status = 200, description = "Updated record", body = BookDetails),
        (status = 400, description = "Invalid copy count"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "No outstanding loan for this borrower")
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    borrower: Borrower,
    Path(id): Path<String>,
    CountBody(count): CountBody,
) -> AppResult<Json<BookDetails>> {
    let book = state
        .services
        .ledger
        .return_copies(&BookId(id), &borrower.id, count)
        .await?;
    Ok(Json(book))
}

/// Return the oldest loans of a book, whoever holds them
#[utoipa::path(
    post,
    path = "/books/{id}/return-any",
    tag = "loans",
    params(
        ("id" = String, Path, description = "Book ID")
    ),
    request_body(content = CopyCount, description = "Defaults to one copy"),
    responses(
        (status = 200, description = "Updated record", body = BookDetails),
        (status = 400, description = "Invalid copy count"),
        (status = 403, description = "Administrator role required"),
        (status = 409, description = "No outstanding loan")
    )
)]
pub async fn return_any(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    Path(id): Path<String>,
    CountBody(count): CountBody,
) -> AppResult<Json<BookDetails>> {
    let book = state
        .services
        .ledger
        .return_any(&BookId(id), count)
        .await?;
    Ok(Json(book))
}

/// Books with copies out, with their borrowers
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    responses(
        (status = 200, description = "Outstanding loans per book", body = Vec<OutstandingBook>),
        (status = 403, description = "Administrator role required")
    )
)]
pub async fn list_outstanding(
    State(state): State<AppState>,
    Admin(_admin): Admin,
) -> Json<Vec<OutstandingBook>> {
    Json(state.services.ledger.list_outstanding().await.to_vec())
}

/// The caller's outstanding loans
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    responses(
        (status = 200, description = "Caller's loans, oldest first", body = Vec<LoanDetails>),
        (status = 401, description = "Borrower identity missing")
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    borrower: Borrower,
) -> Json<Vec<LoanDetails>> {
    Json(state.services.ledger.loans_for(&borrower.id).await)
}
