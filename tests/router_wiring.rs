use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use phonebook::server::{router, SharedStore};
use phonebook::store::MemoryStore;
use phonebook::validation::ValidationMode;

fn seeded() -> SharedStore {
    Arc::new(MemoryStore::with_sample_persons(ValidationMode::Validated))
}

async fn send(store: &SharedStore, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router(Arc::clone(store)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("json body")
}

#[tokio::test]
async fn list_route() {
    let store = seeded();
    let (status, body) = send(&store, Method::GET, "/api/persons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn get_route_statuses_and_bodies() {
    let store = seeded();
    let (status, body) = send(&store, Method::GET, "/api/persons/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({ "name": "Arto Hellas", "number": "040-123456", "id": 1 }));

    let (status, body) = send(&store, Method::GET, "/api/persons/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());

    let (status, body) = send(&store, Method::GET, "/api/persons/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "error": "malformatted id" }));
}

#[tokio::test]
async fn create_route() {
    let store = seeded();
    let (status, body) = send(
        &store,
        Method::POST,
        "/api/persons",
        Some(json!({ "name": "Grace Hopper", "number": "555-0100-42", "id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = parse(&body);
    assert_eq!(created["name"], "Grace Hopper");
    // the caller never chooses the id
    assert_ne!(created["id"], json!(7));

    let (status, body) = send(
        &store,
        Method::POST,
        "/api/persons",
        Some(json!({ "name": "Arto Hellas", "number": "000-00000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "error": "person with given name already exists" }));

    let (status, body) = send(&store, Method::POST, "/api/persons", Some(json!({ "number": "000-00000000" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "error": "name missing" }));
}

#[tokio::test]
async fn wrongly_typed_body_is_a_bad_request() {
    let store = seeded();
    let (status, body) = send(
        &store,
        Method::POST,
        "/api/persons",
        Some(json!({ "name": 123, "number": "000-00000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(parse(&body)["error"].is_string());

    let (status, _) = send(&store, Method::PUT, "/api/persons/1", Some(json!({ "name": ["Ada"], "number": "39-44-0000000" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_route_updates_or_creates() {
    let store = seeded();
    let (status, body) = send(
        &store,
        Method::PUT,
        "/api/persons/2",
        Some(json!({ "name": "Ada Lovelace", "number": "39-44-0000000" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({ "name": "Ada Lovelace", "number": "39-44-0000000", "id": 2 }));

    let (status, body) = send(
        &store,
        Method::PUT,
        "/api/persons/77",
        Some(json!({ "name": "Alan Turing", "number": "44-20-7946000" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(parse(&body)["id"], json!(77));

    let (status, body) = send(
        &store,
        Method::PUT,
        "/api/persons/abc",
        Some(json!({ "name": "Alan Turing", "number": "44-20-7946000" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body), json!({ "error": "malformatted id" }));
}

#[tokio::test]
async fn delete_route_twice() {
    let store = seeded();
    let (status, body) = send(&store, Method::DELETE, "/api/persons/3", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
    let (status, body) = send(&store, Method::DELETE, "/api/persons/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.is_empty());
}

#[tokio::test]
async fn info_route() {
    let store = seeded();
    let (status, body) = send(&store, Method::GET, "/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<div>Phonebook has info for 4 people</div><div>"));
}

#[tokio::test]
async fn unknown_route_falls_back() {
    let store = seeded();
    let (status, body) = send(&store, Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body), json!({ "error": "unknown endpoint" }));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/api/persons")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = router(seeded()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
