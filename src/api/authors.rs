//! Author endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{author::CreateAuthor, Author, BookDetails},
    AppState,
};

use super::{Admin, JsonBody};

/// List registered authors
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses(
        (status = 200, description = "All authors", body = Vec<Author>)
    )
)]
pub async fn list_authors(State(state): State<AppState>) -> Json<Vec<Author>> {
    Json(state.services.authors.list().await)
}

/// Register an author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Author already exists")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    JsonBody(request): JsonBody<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state.services.authors.create(request).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Get an author
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = u32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = Author),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> AppResult<Json<Author>> {
    Ok(Json(state.services.authors.get(id).await?))
}

/// Books linked to an author
#[utoipa::path(
    get,
    path = "/authors/{id}/books",
    tag = "authors",
    params(
        ("id" = u32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author's books", body = Vec<BookDetails>),
        (status = 404, description = "Author not found")
    )
)]
pub async fn author_books(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> AppResult<Json<Vec<BookDetails>>> {
    Ok(Json(state.services.authors.books(id).await?))
}

/// Delete an author without books
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = u32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Author still has books")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    Admin(_admin): Admin,
    Path(id): Path<u32>,
) -> AppResult<StatusCode> {
    state.services.authors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
