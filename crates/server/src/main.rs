// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State as AxumState},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tally::{ActivityPage, AuditLogView, EventLogs, SessionPage, SessionSummary};
use tally_api::{
    ActivityQuery, ApiError, ArtifactStore, CreateSessionRequest, DownloadResponse,
    EndSessionRequest, RecordAuditRequest, SessionFile, SessionFilePathResponse, SessionListQuery,
    UpdateFilePathRequest, begin_artifact_attach, create_session, end_session,
    finish_manual_entry, get_audit_log_by_id, get_event_all_logs, get_event_deletions,
    get_event_modifications, get_event_sessions, get_session_audit_logs, get_session_file_path,
    link_upload, list_activity, list_all_sessions, record, resolve_session_file,
    stream_session_file, translate_artifact_error, update_file_path,
};
use tally_audit::{AuditEntry, EntrySession, SessionClosure};
use tally_domain::Snapshot;
use tally_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Tally Server - HTTP server for the results audit trail
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL. Takes precedence over `--database`.
    #[arg(long)]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Directory holding uploaded and generated session files
    #[arg(long, default_value = "audit-logs")]
    artifacts_dir: PathBuf,
}

/// Application state shared across handlers.
///
/// The single connection is serialized behind an async mutex.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<Persistence>>,
    artifacts: ArtifactStore,
}

/// Query parameters of the upload endpoint.
#[derive(Debug, Deserialize)]
struct UploadQuery {
    /// Name of the file as the client knew it; its extension is kept.
    filename: String,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    /// Error indicator.
    error: bool,
    /// Error message.
    message: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err {
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::AuditWriteFailed { .. } | ApiError::ArtifactIo { .. } | ApiError::Internal { .. } => {
                error!(error = %err, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Write endpoints
// ============================================================================

/// Handler for POST `/audit/logs`.
async fn handle_record(
    AxumState(app_state): AxumState<AppState>,
    Json(request): Json<RecordAuditRequest>,
) -> Result<Json<AuditEntry>, HttpError> {
    info!(action = %request.action, session_id = ?request.session_id, "Handling record request");

    let mut persistence = app_state.persistence.lock().await;
    let entry: AuditEntry = record(&mut persistence, request, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(entry))
}

/// Handler for POST `/audit/sessions`.
async fn handle_create_session(
    AxumState(app_state): AxumState<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<EntrySession>, HttpError> {
    info!(event_id = %request.event_id, entry_method = %request.entry_method, "Handling create_session request");

    let mut persistence = app_state.persistence.lock().await;
    let session: EntrySession = create_session(&mut persistence, request, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(session))
}

/// Handler for POST `/audit/sessions/{id}/end`.
async fn handle_end_session(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    Json(request): Json<EndSessionRequest>,
) -> Result<Json<SessionClosure>, HttpError> {
    info!(session_id, result_count = request.result_count, "Handling end_session request");

    let mut persistence = app_state.persistence.lock().await;
    let closure: SessionClosure =
        end_session(&mut persistence, session_id, request, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(closure))
}

/// Handler for PUT `/audit/sessions/{id}/file`.
async fn handle_update_file_path(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    Json(request): Json<UpdateFilePathRequest>,
) -> Result<Json<EntrySession>, HttpError> {
    info!(session_id, "Handling update_file_path request");

    let mut persistence = app_state.persistence.lock().await;
    let session: EntrySession =
        update_file_path(&mut persistence, session_id, &request, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(session))
}

/// Runs artifact file I/O on the blocking thread pool.
///
/// Callers release the persistence lock before awaiting this.
async fn run_artifact_io<T, F>(task: F) -> Result<T, HttpError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let outcome: Result<T, ApiError> = tokio::task::spawn_blocking(task).await.map_err(|err| {
        error!(error = %err, "Artifact I/O task failed");
        HttpError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: String::from("Artifact I/O task failed"),
        }
    })?;
    outcome.map_err(HttpError::from)
}

/// Handler for POST `/audit/sessions/{id}/upload?filename=`.
///
/// The request body is the raw file.
async fn handle_attach_upload(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    Query(params): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<EntrySession>, HttpError> {
    info!(session_id, filename = %params.filename, size = body.len(), "Handling attach_upload request");
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = app_state.persistence.lock().await;
    let session: EntrySession = begin_artifact_attach(&mut persistence, session_id, now)?;
    drop(persistence);

    let store: ArtifactStore = app_state.artifacts.clone();
    let event_id: String = session.event_id.clone();
    let filename: String = params.filename.clone();
    let path: PathBuf = run_artifact_io(move || {
        store
            .save_uploaded_file(&body, &filename, &event_id, session_id, now)
            .map_err(translate_artifact_error)
    })
    .await?;

    let mut persistence = app_state.persistence.lock().await;
    let session: EntrySession = link_upload(&mut persistence, session, &path, &params.filename)?;
    drop(persistence);

    Ok(Json(session))
}

/// Handler for POST `/audit/sessions/{id}/manual`.
///
/// Takes the manually entered rows, stores their spreadsheet snapshot and
/// closes the session.
async fn handle_complete_manual_entry(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
    Json(rows): Json<Vec<Snapshot>>,
) -> Result<Json<SessionClosure>, HttpError> {
    let row_count: usize = rows.len();
    info!(session_id, rows = row_count, "Handling complete_manual_entry request");
    let now: OffsetDateTime = OffsetDateTime::now_utc();

    let mut persistence = app_state.persistence.lock().await;
    let session: EntrySession = begin_artifact_attach(&mut persistence, session_id, now)?;
    drop(persistence);

    let store: ArtifactStore = app_state.artifacts.clone();
    let path: PathBuf = run_artifact_io(move || {
        store
            .generate_snapshot(&session.event_id, session_id, &rows, now)
            .map_err(translate_artifact_error)
    })
    .await?;

    let mut persistence = app_state.persistence.lock().await;
    let closure: SessionClosure =
        finish_manual_entry(&mut persistence, session_id, &path, row_count, now)?;
    drop(persistence);

    Ok(Json(closure))
}

// ============================================================================
// Read endpoints
// ============================================================================

/// Handler for GET `/audit/logs/{id}`.
async fn handle_get_audit_log(
    AxumState(app_state): AxumState<AppState>,
    Path(audit_entry_id): Path<i64>,
) -> Result<Json<AuditLogView>, HttpError> {
    info!(audit_entry_id, "Handling get_audit_log request");

    let mut persistence = app_state.persistence.lock().await;
    let view: AuditLogView = get_audit_log_by_id(&mut persistence, audit_entry_id)?;
    drop(persistence);

    Ok(Json(view))
}

/// Handler for GET `/audit/sessions/{id}/logs`.
async fn handle_get_session_logs(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
) -> Json<Vec<AuditLogView>> {
    info!(session_id, "Handling get_session_logs request");

    let mut persistence = app_state.persistence.lock().await;
    let logs: Vec<AuditLogView> = get_session_audit_logs(&mut persistence, session_id);
    drop(persistence);

    Json(logs)
}

/// Handler for GET `/audit/sessions`.
async fn handle_list_sessions(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Json<SessionPage> {
    info!(event_id = ?query.event_id, "Handling list_sessions request");

    let mut persistence = app_state.persistence.lock().await;
    let page: SessionPage = list_all_sessions(&mut persistence, &query, OffsetDateTime::now_utc());
    drop(persistence);

    Json(page)
}

/// Handler for GET `/audit/activity`.
async fn handle_list_activity(
    AxumState(app_state): AxumState<AppState>,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<ActivityPage>, HttpError> {
    info!(
        action_type = ?query.action_type,
        season_id = ?query.season_id,
        event_id = ?query.event_id,
        "Handling list_activity request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let page: ActivityPage = list_activity(&mut persistence, &query, OffsetDateTime::now_utc())?;
    drop(persistence);

    Ok(Json(page))
}

/// Handler for GET `/audit/events/{event_id}/sessions`.
async fn handle_event_sessions(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<String>,
) -> Json<Vec<SessionSummary>> {
    info!(event_id = %event_id, "Handling event_sessions request");

    let mut persistence = app_state.persistence.lock().await;
    let sessions: Vec<SessionSummary> =
        get_event_sessions(&mut persistence, &event_id, OffsetDateTime::now_utc());
    drop(persistence);

    Json(sessions)
}

/// Handler for GET `/audit/events/{event_id}/modifications`.
async fn handle_event_modifications(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<String>,
) -> Json<Vec<AuditLogView>> {
    info!(event_id = %event_id, "Handling event_modifications request");

    let mut persistence = app_state.persistence.lock().await;
    let logs: Vec<AuditLogView> = get_event_modifications(&mut persistence, &event_id);
    drop(persistence);

    Json(logs)
}

/// Handler for GET `/audit/events/{event_id}/deletions`.
async fn handle_event_deletions(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<String>,
) -> Json<Vec<AuditLogView>> {
    info!(event_id = %event_id, "Handling event_deletions request");

    let mut persistence = app_state.persistence.lock().await;
    let logs: Vec<AuditLogView> = get_event_deletions(&mut persistence, &event_id);
    drop(persistence);

    Json(logs)
}

/// Handler for GET `/audit/events/{event_id}/all`.
async fn handle_event_all_logs(
    AxumState(app_state): AxumState<AppState>,
    Path(event_id): Path<String>,
) -> Json<EventLogs> {
    info!(event_id = %event_id, "Handling event_all_logs request");

    let mut persistence = app_state.persistence.lock().await;
    let logs: EventLogs = get_event_all_logs(&mut persistence, &event_id, OffsetDateTime::now_utc());
    drop(persistence);

    Json(logs)
}

// ============================================================================
// Download endpoints
// ============================================================================

/// Handler for GET `/audit/sessions/{id}/file`.
async fn handle_get_file_path(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Json<SessionFilePathResponse>, HttpError> {
    info!(session_id, "Handling get_file_path request");

    let mut persistence = app_state.persistence.lock().await;
    let response: SessionFilePathResponse = get_session_file_path(&mut persistence, session_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/audit/sessions/{id}/download`.
async fn handle_download(
    AxumState(app_state): AxumState<AppState>,
    Path(session_id): Path<i64>,
) -> Result<Response, HttpError> {
    info!(session_id, "Handling download request");

    let mut persistence = app_state.persistence.lock().await;
    let file: SessionFile = resolve_session_file(&mut persistence, session_id)?;
    drop(persistence);

    let store: ArtifactStore = app_state.artifacts.clone();
    let download: DownloadResponse =
        run_artifact_io(move || stream_session_file(&store, &file)).await?;

    let filename: String = download
        .filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    Ok((
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        download.bytes,
    )
        .into_response())
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/audit/logs", post(handle_record))
        .route("/audit/logs/{id}", get(handle_get_audit_log))
        .route("/audit/sessions", post(handle_create_session).get(handle_list_sessions))
        .route("/audit/sessions/{id}/end", post(handle_end_session))
        .route(
            "/audit/sessions/{id}/file",
            put(handle_update_file_path).get(handle_get_file_path),
        )
        .route("/audit/sessions/{id}/upload", post(handle_attach_upload))
        .route("/audit/sessions/{id}/manual", post(handle_complete_manual_entry))
        .route("/audit/sessions/{id}/logs", get(handle_get_session_logs))
        .route("/audit/sessions/{id}/download", get(handle_download))
        .route("/audit/activity", get(handle_list_activity))
        .route("/audit/events/{event_id}/sessions", get(handle_event_sessions))
        .route("/audit/events/{event_id}/modifications", get(handle_event_modifications))
        .route("/audit/events/{event_id}/deletions", get(handle_event_deletions))
        .route("/audit/events/{event_id}/all", get(handle_event_all_logs))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Tally Server");

    let persistence: Persistence = if let Some(url) = &args.mysql_url {
        info!("Using MySQL/MariaDB database");
        Persistence::new_with_mysql(url)?
    } else if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    info!(artifacts_dir = %args.artifacts_dir.display(), "Storing session files");
    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        artifacts: ArtifactStore::new(args.artifacts_dir),
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
