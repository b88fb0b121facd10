use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Local, TimeZone};

use phonebook::error::PhonebookError;
use phonebook::server::{
    create_person, delete_person, get_person, list_persons, show_info, summary, unknown_endpoint,
    update_person, SharedStore,
};
use phonebook::store::{EntryStore, MemoryStore};
use phonebook::validation::{Candidate, ValidationMode};

fn seeded() -> SharedStore {
    Arc::new(MemoryStore::with_sample_persons(ValidationMode::Validated))
}

fn status_of(result: Result<impl IntoResponse, PhonebookError>) -> StatusCode {
    result.into_response().status()
}

#[tokio::test]
async fn list_returns_all_entries() {
    let Json(entries) = list_persons(State(seeded())).await.expect("list");
    assert_eq!(entries.len(), 4);
}

#[tokio::test]
async fn get_maps_errors_to_statuses() {
    let store = seeded();
    let Json(entry) = get_person(State(store.clone()), Path("1".to_string())).await.expect("get");
    assert_eq!(entry.name, "Arto Hellas");
    assert_eq!(
        status_of(get_person(State(store.clone()), Path("999".to_string())).await),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(get_person(State(store), Path("not-an-id".to_string())).await),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn create_answers_created_or_bad_request() {
    let store = seeded();
    let (status, Json(entry)) = create_person(
        State(store.clone()),
        Ok(Json(Candidate::new("Grace Hopper", "555-0100-42"))),
    )
    .await
    .expect("create");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.get(&entry.id.to_string()).unwrap(), entry);

    let duplicate = create_person(State(store.clone()), Ok(Json(Candidate::new("Arto Hellas", "000-00000000")))).await;
    assert_eq!(status_of(duplicate), StatusCode::BAD_REQUEST);
    let missing = create_person(State(store), Ok(Json(Candidate::default()))).await;
    assert_eq!(status_of(missing), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_distinguishes_updated_from_created() {
    let store = seeded();
    let (status, Json(entry)) = update_person(
        State(store.clone()),
        Path("2".to_string()),
        Ok(Json(Candidate::new("Ada Lovelace", "39-44-0000000"))),
    )
    .await
    .expect("update");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry.number, "39-44-0000000");

    let (status, _) = update_person(
        State(store.clone()),
        Path("12345".to_string()),
        Ok(Json(Candidate::new("Alan Turing", "44-20-7946000"))),
    )
    .await
    .expect("upsert");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.count().unwrap(), 5);
}

#[tokio::test]
async fn delete_twice() {
    let store = seeded();
    let status = delete_person(State(store.clone()), Path("3".to_string())).await.expect("delete");
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        status_of(delete_person(State(store), Path("3".to_string())).await),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn info_counts_people() {
    let store = seeded();
    let page = show_info(State(store)).await.expect("info").0;
    assert!(page.starts_with("<div>Phonebook has info for 4 people</div><div>"));
}

#[test]
fn summary_renders_count_and_time() {
    let now = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let page = summary(2, now);
    assert!(page.starts_with("<div>Phonebook has info for 2 people</div>"));
    assert!(page.contains("Fri Mar 01 2024 12:30:00"));
}

#[tokio::test]
async fn unknown_endpoint_is_not_found() {
    let (status, Json(body)) = unknown_endpoint().await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.error, "unknown endpoint");
}

#[test]
fn storage_failures_are_server_errors() {
    let response = PhonebookError::Persistence("disk gone".into()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
