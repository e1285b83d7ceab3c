//! API integration tests, driving the router in-process over a memory store

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_server::{
    api,
    config::{AppConfig, StorageBackend},
    repository::{MemoryStore, Store},
    services::Services,
    AppState,
};

async fn app_with_store(store: Arc<dyn Store>) -> Router {
    let services = Services::new(store).await.expect("Failed to load catalogue");
    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Memory;
    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

async fn app() -> Router {
    app_with_store(Arc::new(MemoryStore::default())).await
}

/// Send a request as `who` (with `role`), returning status and JSON body
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    who: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_raw(app, method, uri, who, body.map(|body| body.to_string())).await
}

/// Like `send`, with the body passed through verbatim
async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    who: Option<(&str, &str)>,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    if let Some((borrower, role)) = who {
        builder = builder
            .header(api::BORROWER_HEADER, borrower)
            .header(api::ROLE_HEADER, role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response is not JSON")
    };
    (status, value)
}

const ADMIN: Option<(&str, &str)> = Some(("librarian", "admin"));
const ANN: Option<(&str, &str)> = Some(("ann", "member"));
const BOB: Option<(&str, &str)> = Some(("bob", "member"));

async fn seed(app: &Router, id: &str, title: &str, author: &str, copies: u32) {
    let (status, _) = send(
        app,
        Method::POST,
        "/books",
        ADMIN,
        Some(json!({ "id": id, "title": title, "author": author, "copies": copies })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_backend_and_counts() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 2).await;
    send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["books"], 1);
    assert_eq!(body["loans"], 1);
}

#[tokio::test]
async fn test_add_and_merge_book() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 5).await;
    seed(&app, "b1", "Dune", "Frank Herbert", 5).await;

    let (status, body) = send(&app, Method::GET, "/books/b1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 10);
    assert_eq!(body["borrowed"], 0);
    assert_eq!(body["available"], 10);
}

#[tokio::test]
async fn test_catalogue_changes_require_admin() {
    let app = app().await;
    let request = json!({ "id": "b1", "title": "Dune", "author": "Herbert", "copies": 1 });

    let (status, _) = send(&app, Method::POST, "/books", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::POST, "/books", ANN, Some(request)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_search_keeps_catalogue_order() {
    let app = app().await;
    seed(&app, "3", "Emma", "Jane Austen", 1).await;
    seed(&app, "1", "Dune", "Frank Herbert", 1).await;
    seed(&app, "2", "Persuasion", "Jane Austen", 1).await;

    let (_, all) = send(&app, Method::GET, "/books", None, None).await;
    let ids: Vec<_> = all.as_array().unwrap().iter().map(|b| b["id"].clone()).collect();
    assert_eq!(ids, vec![json!("3"), json!("1"), json!("2")]);

    let (_, austen) = send(&app, Method::GET, "/books?q=austen", None, None).await;
    assert_eq!(austen.as_array().unwrap().len(), 2);

    let (_, none) = send(&app, Method::GET, "/books?q=nonexistent-xyz", None, None).await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 2).await;

    let (status, body) = send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 1);

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/b1/borrow",
        BOB,
        Some(json!({ "count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NotAvailable");

    let (status, body) = send(&app, Method::POST, "/books/b1/return", BOB, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NoSuchLoan");

    let (_, mine) = send(&app, Method::GET, "/loans/mine", ANN, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["book"]["id"], "b1");

    let (status, body) = send(&app, Method::POST, "/books/b1/return", ANN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 0);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_outstanding_loans_listing() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 3).await;
    seed(&app, "b2", "Emma", "Jane Austen", 1).await;
    send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;
    send(&app, Method::POST, "/books/b1/borrow", BOB, None).await;

    let (status, _) = send(&app, Method::GET, "/loans", ANN, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/loans", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["id"], "b1");
    assert_eq!(entries[0]["borrowers"], json!(["ann", "bob"]));

    let (status, body) = send(&app, Method::POST, "/books/b1/return-any", ADMIN, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 1);
    let (_, mine) = send(&app, Method::GET, "/loans/mine", ANN, None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_copies_and_delete() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 2).await;
    send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;

    let (status, body) = send(&app, Method::DELETE, "/books/b1", ADMIN, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "HasOutstandingLoans");

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/b1/remove-copies",
        ADMIN,
        Some(json!({ "count": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidQuantity");

    send(&app, Method::POST, "/books/b1/return", ANN, None).await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/books/b1/remove-copies",
        ADMIN,
        Some(json!({ "count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send(&app, Method::GET, "/books/b1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/books/b1", ADMIN, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authors() {
    let app = app().await;
    let (status, author) = send(
        &app,
        Method::POST,
        "/authors",
        ADMIN,
        Some(json!({ "name": "Mary Shelley", "bio": "English novelist" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let author_id = author["id"].as_u64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/authors",
        ADMIN,
        Some(json!({ "name": "Mary Shelley" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, book) = send(
        &app,
        Method::POST,
        "/books",
        ADMIN,
        Some(json!({ "id": "f1", "title": "Frankenstein", "author_id": author_id, "copies": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["author"], "Mary Shelley");

    let uri = format!("/authors/{}", author_id);
    let (status, body) = send(&app, Method::DELETE, &uri, ADMIN, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "AuthorHasBooks");

    let (_, books) = send(&app, Method::GET, &format!("{}/books", uri), None, None).await;
    assert_eq!(books.as_array().unwrap().len(), 1);

    send(&app, Method::DELETE, "/books/f1", ADMIN, None).await;
    let (status, _) = send(&app, Method::DELETE, &uri, ADMIN, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let store = Arc::new(MemoryStore::default());
    let app = app_with_store(store.clone()).await;
    seed(&app, "b1", "Dune", "Frank Herbert", 2).await;
    send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;

    let restarted = app_with_store(store).await;
    let (_, body) = send(&restarted, Method::GET, "/books/b1", None, None).await;
    assert_eq!(body["borrowed"], 1);
    let (_, mine) = send(&restarted, Method::GET, "/loans/mine", ANN, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

/// (total, borrowed) of a book
async fn counts(app: &Router, id: &str) -> (Value, Value) {
    let (_, body) = send(app, Method::GET, &format!("/books/{}", id), None, None).await;
    (body["total"].clone(), body["borrowed"].clone())
}

const BAD_COUNTS: [&str; 6] = [
    r#"{"count": -5}"#,
    r#"{"count": "two"}"#,
    r#"{"count": 99999999999}"#,
    r#"{"count": 1.5}"#,
    r#"{"copies": 2}"#,
    r#"{not json"#,
];

#[tokio::test]
async fn test_malformed_counts_change_nothing() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 3).await;
    send(&app, Method::POST, "/books/b1/borrow", ANN, None).await;

    let routes = [
        ("/books/b1/borrow", ANN),
        ("/books/b1/return", ANN),
        ("/books/b1/return-any", ADMIN),
        ("/books/b1/remove-copies", ADMIN),
    ];
    for (uri, who) in routes {
        for bad in BAD_COUNTS {
            let (status, body) =
                send_raw(&app, Method::POST, uri, who, Some(bad.to_string())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} with {}", uri, bad);
            assert_eq!(body["error"], "InvalidQuantity", "{} with {}", uri, bad);
        }

        let (status, body) =
            send(&app, Method::POST, uri, who, Some(json!({ "count": 0 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} with zero", uri);
        assert_eq!(body["error"], "InvalidQuantity");

        assert_eq!(counts(&app, "b1").await, (json!(3), json!(1)));
    }

    let (_, mine) = send(&app, Method::GET, "/loans/mine", ANN, None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_absent_count_means_one_copy() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 3).await;

    let (status, body) =
        send_raw(&app, Method::POST, "/books/b1/borrow", ANN, Some(String::new())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 1);

    let (status, body) = send(&app, Method::POST, "/books/b1/borrow", ANN, Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 2);

    let (status, body) = send(
        &app,
        Method::POST,
        "/books/b1/return",
        ANN,
        Some(json!({ "count": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["borrowed"], 0);
}

#[tokio::test]
async fn test_malformed_add_book_is_rejected() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 2).await;

    let bodies = [
        r#"{"id": "b1", "copies": -1}"#.to_string(),
        r#"{"id": "b1", "copies": "many"}"#.to_string(),
        r#"{"id": "b1"}"#.to_string(),
        r#"{"id": "b1", "copies": 2"#.to_string(),
        String::new(),
    ];
    for body in bodies {
        let (status, response) =
            send_raw(&app, Method::POST, "/books", ADMIN, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
        assert_eq!(response["error"], "BadValue", "{}", body);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        ADMIN,
        Some(json!({ "id": "b1", "copies": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidQuantity");

    assert_eq!(counts(&app, "b1").await, (json!(2), json!(0)));
}

#[tokio::test]
async fn test_return_any_without_loans() {
    let app = app().await;
    seed(&app, "b1", "Dune", "Frank Herbert", 1).await;

    let (status, body) = send(&app, Method::POST, "/books/b1/return-any", ADMIN, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NoSuchLoan");
    assert_eq!(body["message"], "No outstanding loan of book 'b1'");
}
