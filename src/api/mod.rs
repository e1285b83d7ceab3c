//! JSON API handlers for the lending server

pub mod authors;
pub mod books;
pub mod error;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::AppError,
    models::{loan::CopyCount, BorrowerId, Role},
    AppState,
};

/// Header carrying the borrower identity set by the authenticating proxy
pub const BORROWER_HEADER: &str = "x-borrower";
/// Header carrying the borrower role (`admin` or anything else)
pub const ROLE_HEADER: &str = "x-borrower-role";

/// Borrower identity supplied by the upstream authentication layer
#[derive(Debug, Clone)]
pub struct Borrower {
    pub id: BorrowerId,
    pub role: Role,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Borrower {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(BORROWER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Authentication(format!("Missing {} header", BORROWER_HEADER))
            })?;

        let role = parts
            .headers
            .get(ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(Role::from)
            .unwrap_or_default();

        Ok(Borrower {
            id: BorrowerId::from(id),
            role,
        })
    }
}

/// Borrower with the administrator role
#[derive(Debug, Clone)]
pub struct Admin(pub Borrower);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let borrower = Borrower::from_request_parts(parts, state).await?;
        if borrower.role != Role::Admin {
            return Err(AppError::Authorization(
                "Administrator role required".to_string(),
            ));
        }
        Ok(Admin(borrower))
    }
}

/// JSON request body; a malformed body is a `Validation` error
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Copy count body of borrow / return / removal requests.
///
/// An absent body means one copy; anything else must be a valid
/// `{"count": n}` document or the request fails with `InvalidQuantity`.
#[derive(Debug, Clone, Copy)]
pub struct CountBody(pub u32);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for CountBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(CountBody(CopyCount::default().count));
        }

        let body: CopyCount = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::InvalidQuantity(format!("invalid copy count: {}", e)))?;
        Ok(CountBody(body.count))
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Catalogue
        .route("/books", get(books::search_books).post(books::add_book))
        .route("/books/:id", get(books::get_book).delete(books::delete_book))
        .route("/books/:id/remove-copies", post(books::remove_copies))
        // Ledger
        .route("/books/:id/borrow", post(loans::borrow_book))
        .route("/books/:id/return", post(loans::return_book))
        .route("/books/:id/return-any", post(loans::return_any))
        .route("/loans", get(loans::list_outstanding))
        .route("/loans/mine", get(loans::my_loans))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author).delete(authors::delete_author),
        )
        .route("/authors/:id/books", get(authors::author_books))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
