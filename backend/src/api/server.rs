//! HTTP server for the archive.
//!
//! Public history reads plus admin endpoints for editing entries, migrating a
//! CSV sheet and exporting the archive. Access control is expected in front of
//! this server.
//!
//! # API Endpoints
//!
//! | Method | Path                       | Description                          |
//! |--------|----------------------------|--------------------------------------|
//! | GET    | `/health`                  | Health check                         |
//! | GET    | `/api/history`             | `{stats, data}`, optional filters    |
//! | GET    | `/api/admin/years`         | List stored entries                  |
//! | POST   | `/api/admin/years`         | Create an entry                      |
//! | GET    | `/api/admin/years/{id}`    | Get an entry                         |
//! | PUT    | `/api/admin/years/{id}`    | Update an entry                      |
//! | DELETE | `/api/admin/years/{id}`    | Delete an entry                      |
//! | POST   | `/api/admin/migrate`       | Upload a CSV sheet (`file`, `mode`)  |
//! | GET    | `/api/admin/export`        | Export as `?format=json` or `csv`    |
//! | GET    | `/api/logs`                | SSE stream for real-time logs        |
//! | GET    | `/images/*`                | Static images, if configured         |

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_label, error_response, status_for, DeleteResponse, MigrateResponse};
use crate::config::ArchiveConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::export::{export, ExportFormat};
use crate::models::{HistoryDataset, StoredEntry, YearEntry};
use crate::store::EntryStore;
use crate::transform::aggregate::{build_dataset, EntryFilter};
use crate::transform::pipeline::{migrate_into_store, MigrateMode};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// One store, serialized behind a mutex
    pub store: Arc<Mutex<EntryStore>>,
    pub config: Arc<ArchiveConfig>,
}

impl AppState {
    pub fn new(store: EntryStore, config: ArchiveConfig) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            log_error(self.to_string());
        }
        let body = error_response(error_label(status), Some(&self.to_string()));
        (status, Json(body)).into_response()
    }
}

/// Build the router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let mut app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/history", get(get_history))
        .route("/api/admin/years", get(list_entries).post(create_entry))
        .route(
            "/api/admin/years/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/admin/migrate", post(migrate_csv))
        .route("/api/admin/export", get(export_archive))
        .route("/api/logs", get(sse_logs));

    if let Some(ref dir) = state.config.image_dir {
        app = app.nest_service("/images", ServeDir::new(dir));
    }

    app.layer(cors).with_state(state)
}

/// Open the store and serve until the process stops
pub async fn start_server(config: ArchiveConfig) -> ServerResult<()> {
    let store = EntryStore::open(&config.data_dir)?;
    let port = config.port;

    println!("🎷 Jazz archive server running on http://localhost:{}", port);
    println!("   Store: {} ({} entries)", store.dir().display(), store.len());
    println!("   GET  /api/history        - Public history");
    println!("   *    /api/admin/years    - Entry CRUD");
    println!("   POST /api/admin/migrate  - Upload CSV sheet");
    println!("   GET  /api/admin/export   - Export json|csv");
    println!("   GET  /api/logs           - SSE log stream");
    if let Some(ref dir) = config.image_dir {
        println!("   GET  /images             - {}", dir.display());
    }
    println!();

    let app = build_router(AppState::new(store, config));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let entries = state.store.lock().await.len();
    Json(json!({
        "status": "ok",
        "service": "jazz-archive",
        "version": env!("CARGO_PKG_VERSION"),
        "entries": entries,
    }))
}

async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<EntryFilter>, QueryRejection>,
) -> ServerResult<Json<HistoryDataset>> {
    let Query(filter) = query?;
    let entries = state.store.lock().await.year_entries();
    Ok(Json(build_dataset(filter.apply(entries))))
}

async fn list_entries(State(state): State<AppState>) -> Json<Vec<StoredEntry>> {
    let store = state.store.lock().await;
    Json(store.list().into_iter().cloned().collect())
}

async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<StoredEntry>> {
    let store = state.store.lock().await;
    Ok(Json(store.get(&id)?.clone()))
}

async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<YearEntry>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<StoredEntry>)> {
    let Json(entry) = payload?;
    let stored = state.store.lock().await.create(entry)?;
    log_info(format!(
        "Created entry {} ({} {})",
        stored.id, stored.entry.year, stored.entry.band
    ));
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<YearEntry>, JsonRejection>,
) -> ServerResult<Json<StoredEntry>> {
    let Json(entry) = payload?;
    let stored = state.store.lock().await.update(&id, entry)?;
    log_info(format!("Updated entry {}", stored.id));
    Ok(Json(stored))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<DeleteResponse>> {
    state.store.lock().await.delete(&id)?;
    log_info(format!("Deleted entry {}", id));
    Ok(Json(DeleteResponse { success: true }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the missed entries
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn migrate_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<MigrateResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut mode = MigrateMode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "mode" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                mode = text.parse().map_err(ServerError::BadRequest)?;
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    log_info(format!(
        "📄 Migration upload: {} ({} bytes, {:?})",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        mode
    ));

    let options = state
        .config
        .migration_options(mode)
        .map_err(PipelineError::from)?;

    let mut store = state.store.lock().await;
    let (report, summary) = migrate_into_store(&mut store, &bytes, &options)?;

    Ok(Json(MigrateResponse::new(report, summary, mode)))
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

async fn export_archive(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> ServerResult<Response> {
    let Query(query) = query?;
    let format: ExportFormat = query.format.as_deref().unwrap_or("json").parse()?;
    let entries = state.store.lock().await.year_entries();
    let body = export(entries, format, state.config.export_max_items)?;

    let disposition = format!("attachment; filename=\"jazz-history.{}\"", format.extension());
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
