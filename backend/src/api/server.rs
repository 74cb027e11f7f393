//! HTTP server for the shortfall service.
//!
//! # API Endpoints
//!
//! | Method | Path                 | Description                          |
//! |--------|----------------------|--------------------------------------|
//! | GET    | `/health`            | Health check                         |
//! | POST   | `/upload`            | Upload a workbook and process it     |
//! | GET    | `/status/{task_id}`  | Job status                           |
//! | GET    | `/result/{task_id}`  | Download the resulting `.xlsx`       |
//! | GET    | `/jobs`              | All jobs, newest first               |
//! | GET    | `/logs`              | SSE stream of job logs               |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{JobSummary, TaskStatus, UploadResponse};
use crate::config::{Config, StorageLayout};
use crate::error::{ServerError, ServerResult};
use crate::jobs::{run_job, FileJobStore, JobRecord, JobState, JobStore};
use crate::transform::PipelineOptions;
use crate::writer::XLSX_CONTENT_TYPE;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub layout: Arc<StorageLayout>,
    pub store: Arc<dyn JobStore>,
    pub options: Arc<PipelineOptions>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn JobStore>) -> Self {
        Self {
            layout: Arc::new(config.layout()),
            store,
            options: Arc::new(PipelineOptions {
                sheet: config.sheet.clone(),
                ..Default::default()
            }),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Look up a job; ids that are not UUIDs never match.
    fn find_job(&self, task_id: &str) -> ServerResult<Option<JobRecord>> {
        if Uuid::parse_str(task_id).is_err() {
            return Ok(None);
        }
        Ok(self.store.get(task_id)?)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/status/{task_id}", get(task_status))
        .route("/result/{task_id}", get(task_result))
        .route("/jobs", get(list_jobs))
        .route("/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server with a file-backed job store.
pub async fn start_server(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let layout = config.layout();
    layout.ensure_dirs()?;

    let store: Arc<dyn JobStore> = Arc::new(FileJobStore::new(layout.status_file()));
    let app = router(AppState::new(config, store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Shortfall server running on http://localhost:{}", config.port);
    println!("   POST /upload            - Upload a workbook (.xlsx, .xlsb)");
    println!("   GET  /status/{{task_id}}  - Job status");
    println!("   GET  /result/{{task_id}}  - Download result");
    println!("   GET  /logs              - SSE log stream");
    println!();
    log_info(format!("Storage: {}", layout.root().display()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "shortfall",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Upload endpoint: store the file, process it, return the task id.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(String::from);
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    let task_id = Uuid::new_v4().to_string();
    let job_id = task_id.clone();

    tokio::task::spawn_blocking(move || {
        run_job(
            &state.layout,
            state.store.as_ref(),
            &state.options,
            &job_id,
            file_name.as_deref(),
            &bytes,
        )
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Job aborted: {}", e)))?;

    Ok(Json(UploadResponse { task_id }))
}

async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ServerResult<Json<TaskStatus>> {
    let record = state
        .find_job(&task_id)?
        .ok_or_else(|| ServerError::NotFound("Task not found".to_string()))?;

    Ok(Json(TaskStatus::from_record(task_id, &record)))
}

async fn task_result(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> ServerResult<Response> {
    let ready = state
        .find_job(&task_id)?
        .is_some_and(|record| record.status == JobState::Success);
    if !ready {
        return Err(ServerError::NotFound("Result not ready".to_string()));
    }

    let path = state.layout.output_path(&task_id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServerError::NotFound("File not found".to_string()))
        }
        Err(e) => return Err(ServerError::Internal(e.to_string())),
    };

    let headers = [
        (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.xlsx\"", task_id),
        ),
    ];
    Ok((headers, bytes).into_response())
}

async fn list_jobs(State(state): State<AppState>) -> ServerResult<Json<Vec<JobSummary>>> {
    let mut jobs: Vec<JobSummary> = state
        .store
        .list()?
        .into_iter()
        .map(|(task_id, record)| JobSummary { task_id, record })
        .collect();
    jobs.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));

    Ok(Json(jobs))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
