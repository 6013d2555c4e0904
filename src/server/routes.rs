//! Axum HTTP routes for the student records API.

use crate::average::{compute_averages, StudentAverage};
use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};
use crate::server::pages;
use crate::store::{CsvStore, StudentRecord, StudentUpdate};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    pub store: Arc<CsvStore>,

    /// Records per average worker thread
    pub thread_size: usize,
}

impl AppState {
    pub fn new(store: CsvStore, thread_size: usize) -> Self {
        Self {
            store: Arc::new(store),
            thread_size,
        }
    }
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/insert", get(insert_page).post(insert_record))
        .route("/remove", get(remove_page).post(remove_form))
        .route("/remove/:roll_no", delete(remove_record))
        .route(
            "/update",
            get(update_page).post(update_form).put(update_record),
        )
        .route("/read", get(read_record))
        .route("/average", get(average))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Run file I/O and worker threads off the async executor
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    F: FnOnce() -> ServerResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

fn message(text: &str) -> Json<Value> {
    Json(serde_json::json!({ "message": text }))
}

/// Form value for `key`, if present and not blank
fn form_value<'a>(form: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    form.get(key)
        .map(String::as_str)
        .filter(|value| !value.trim().is_empty())
}

// ─── Pages ───────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(pages::INDEX)
}

async fn insert_page() -> Html<&'static str> {
    Html(pages::INSERT)
}

async fn remove_page() -> Html<&'static str> {
    Html(pages::REMOVE)
}

async fn update_page() -> Html<&'static str> {
    Html(pages::UPDATE)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "student-records",
    }))
}

// ─── Handlers ────────────────────────────────────────────────────

async fn insert_record(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> ServerResult<impl IntoResponse> {
    let Some(record) = StudentRecord::from_form(&form) else {
        warn!("Insert request missing required fields");
        return Err(ServerError::MissingFields);
    };

    let store = Arc::clone(&state.store);
    blocking(move || {
        store
            .insert(record)
            .map_err(|e| ServerError::from_store(e, "Failed to write record"))
    })
    .await?;

    Ok((StatusCode::CREATED, message("Record inserted successfully")))
}

async fn remove_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match form_value(&form, "RollNo") {
        Some(roll_no) => {
            info!(roll_no = %roll_no, "Remove request");
            remove_by_roll_no(&state, roll_no.to_string())
                .await
                .into_response()
        }
        None => Html(pages::REMOVE).into_response(),
    }
}

async fn remove_record(
    State(state): State<Arc<AppState>>,
    Path(roll_no): Path<String>,
) -> ServerResult<Json<Value>> {
    remove_by_roll_no(&state, roll_no).await
}

async fn remove_by_roll_no(state: &AppState, roll_no: String) -> ServerResult<Json<Value>> {
    let store = Arc::clone(&state.store);
    blocking(move || {
        store
            .remove(&roll_no)
            .map_err(|e| ServerError::from_store(e, "Failed to delete record"))
    })
    .await?;

    Ok(message("Record deleted successfully"))
}

async fn update_form(
    State(state): State<Arc<AppState>>,
    Form(form): Form<HashMap<String, String>>,
) -> ServerResult<Json<Value>> {
    let Some(update) = StudentUpdate::from_form(&form) else {
        warn!("Update request missing RollNo");
        return Err(ServerError::MissingFields);
    };

    info!(roll_no = %update.roll_no, "Update request");
    apply_update(&state, update).await
}

async fn update_record(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StudentUpdate>, JsonRejection>,
) -> ServerResult<Json<Value>> {
    let Json(update) = payload.map_err(|e| {
        warn!(reason = %e.body_text(), "Malformed update request");
        ServerError::MissingFields
    })?;

    if update.roll_no.trim().is_empty() {
        warn!("Update request missing RollNo");
        return Err(ServerError::MissingFields);
    }

    apply_update(&state, update).await
}

async fn apply_update(state: &AppState, update: StudentUpdate) -> ServerResult<Json<Value>> {
    let store = Arc::clone(&state.store);
    blocking(move || {
        store
            .update(&update)
            .map_err(|e| ServerError::from_store(e, "Failed to update record"))
    })
    .await?;

    Ok(message("Record updated successfully"))
}

/// Query string for /read
#[derive(Deserialize)]
struct ReadQuery {
    #[serde(rename = "RollNo")]
    roll_no: Option<String>,
}

async fn read_record(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReadQuery>,
) -> Response {
    let Some(roll_no) = query.roll_no.filter(|r| !r.trim().is_empty()) else {
        return Html(pages::READ).into_response();
    };

    let store = Arc::clone(&state.store);
    let result = blocking(move || {
        store
            .find(&roll_no)
            .map_err(|e| ServerError::from_store(e, "Failed to read record"))
    })
    .await;

    match result {
        Ok(record) => Json(record).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn average(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<StudentAverage>>> {
    let store = Arc::clone(&state.store);
    let thread_size = state.thread_size;

    let averages = blocking(move || {
        let records = store.read_all().map_err(ServerError::ReadFailed)?;
        Ok(compute_averages(records, thread_size)?)
    })
    .await?;

    info!(students = averages.len(), "Calculated average marks for all students");
    Ok(Json(averages))
}

// ─── Server startup ──────────────────────────────────────────────

/// Start the records server
pub async fn serve(config: &AppConfig) -> crate::error::Result<()> {
    let store = CsvStore::new(&config.csv_file);
    let created = store.ensure_exists()?;

    if created {
        eprintln!("Created {}", config.csv_file.display());
    } else {
        eprintln!("Using records from {}", config.csv_file.display());
    }

    let state = Arc::new(AppState::new(store, config.thread_size));
    let router = build_router(state);
    let addr = config.listen_addr;

    eprintln!("Student records server listening on http://{}", addr);
    eprintln!("Endpoints:");
    eprintln!("  GET    /            index page");
    eprintln!("  POST   /insert      insert a record (form)");
    eprintln!("  POST   /remove      remove a record (form)");
    eprintln!("  DELETE /remove/:id  remove a record");
    eprintln!("  POST   /update      update a record (form)");
    eprintln!("  PUT    /update      update a record (JSON)");
    eprintln!("  GET    /read        read a record (?RollNo=)");
    eprintln!("  GET    /average     average marks per student");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    eprintln!("\nServer shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down gracefully...");
}
