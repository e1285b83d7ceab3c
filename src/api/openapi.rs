//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, books, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lending Server API",
        version = "1.0.0",
        description = "Book catalogue and loan ledger REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::search_books,
        books::add_book,
        books::get_book,
        books::delete_book,
        books::remove_copies,
        // Loans
        loans::borrow_book,
        loans::return_book,
        loans::return_any,
        loans::list_outstanding,
        loans::my_loans,
        // Authors
        authors::list_authors,
        authors::create_author,
        authors::get_author,
        authors::author_books,
        authors::delete_author,
    ),
    components(
        schemas(
            // Books
            crate::models::book::BookId,
            crate::models::book::BookDetails,
            crate::models::book::AddBook,
            books::RemoveCopiesResponse,
            // Loans
            crate::models::borrower::BorrowerId,
            crate::models::loan::CopyCount,
            crate::models::loan::LoanDetails,
            crate::models::loan::OutstandingBook,
            // Authors
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            crate::config::StorageBackend,
            // Errors
            crate::api::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Catalogue management"),
        (name = "loans", description = "Borrowing and returning"),
        (name = "authors", description = "Author registry")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
