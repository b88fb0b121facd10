use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Local};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

use crate::error::{PhonebookError, Result};
use crate::store::{Entry, EntryStore};
use crate::validation::Candidate;

pub type SharedStore = Arc<dyn EntryStore>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Json<Self> {
        Json(Self { error: error.into() })
    }
}

impl IntoResponse for PhonebookError {
    fn into_response(self) -> Response {
        match self {
            PhonebookError::NotFound => StatusCode::NOT_FOUND.into_response(),
            PhonebookError::InvalidId(raw) => {
                warn!(id = %raw, "malformatted id");
                (StatusCode::BAD_REQUEST, ErrorBody::new("malformatted id")).into_response()
            }
            PhonebookError::MalformedBody(reason) => {
                warn!(%reason, "malformed body");
                (StatusCode::BAD_REQUEST, ErrorBody::new(reason)).into_response()
            }
            PhonebookError::Validation(e) => {
                warn!(field = %e.field(), error = %e, "validation failed");
                (StatusCode::BAD_REQUEST, ErrorBody::new(e.to_string())).into_response()
            }
            other => {
                error!(error = %other, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new("internal error")).into_response()
            }
        }
    }
}

pub fn router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    Router::new()
        .route("/api/persons", get(list_persons).post(create_person))
        .route(
            "/api/persons/:id",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/info", get(show_info))
        .fallback(unknown_endpoint)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(store)
}

pub async fn serve(port: u16, store: SharedStore) -> Result<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(%address, "Server running");
    axum::serve(listener, router(store)).await?;
    Ok(())
}

// Stores are synchronous, so every call is run on the blocking pool.
async fn blocking<T, F>(store: &SharedStore, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn EntryStore) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || work(store.as_ref()))
        .await
        .map_err(|e| {
            warn!(error = %e, "Join error");
            PhonebookError::Execution(e.to_string())
        })?
}

fn candidate(payload: std::result::Result<Json<Candidate>, JsonRejection>) -> Result<Candidate> {
    payload
        .map(|Json(candidate)| candidate)
        .map_err(|rejection| PhonebookError::MalformedBody(rejection.body_text()))
}

pub async fn list_persons(State(store): State<SharedStore>) -> Result<Json<Vec<Entry>>> {
    let entries = blocking(&store, |s| s.list()).await?;
    Ok(Json(entries))
}

pub async fn get_person(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Entry>> {
    let entry = blocking(&store, move |s| s.get(&id)).await?;
    Ok(Json(entry))
}

pub async fn create_person(
    State(store): State<SharedStore>,
    payload: std::result::Result<Json<Candidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>)> {
    let candidate = candidate(payload)?;
    let entry = blocking(&store, move |s| s.insert(candidate)).await?;
    info!(id = %entry.id, "created entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_person(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Candidate>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>)> {
    let candidate = candidate(payload)?;
    let outcome = blocking(&store, move |s| s.update(&id, candidate)).await?;
    let status = if outcome.created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    info!(id = %outcome.entry().id, created = outcome.created(), "updated entry");
    Ok((status, Json(outcome.into_entry())))
}

pub async fn delete_person(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    blocking(&store, move |s| s.remove(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn show_info(State(store): State<SharedStore>) -> Result<Html<String>> {
    let count = blocking(&store, |s| s.count()).await?;
    Ok(Html(summary(count, Local::now())))
}

/// The body of the info page.
pub fn summary(count: usize, now: DateTime<Local>) -> String {
    format!(
        "<div>Phonebook has info for {} people</div><div>{}</div>",
        count,
        now.format("%a %b %d %Y %H:%M:%S GMT%z")
    )
}

pub async fn unknown_endpoint() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, ErrorBody::new("unknown endpoint"))
}
