// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for the audit trail.
//!
//! Write handlers never swallow a store failure. Read handlers degrade: a
//! failing source query is logged and treated as empty so the rest of the
//! response still renders.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tally::{
    ActivityFilter, ActivityInputs, ActivityPage, ActivityType, AuditLogView, Directory,
    EventLogs, SessionPage, SessionSummary, event_log_views, page_sessions, summarize_sessions,
};
use tally_audit::{
    AuditEntry, EntrySession, NewAuditEntry, NewEntrySession, SessionClosure,
    validate_result_count,
};
use tally_domain::{AuditAction, EntryMethod, Snapshot};
use tally_persistence::{Persistence, PersistenceError};
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::artifacts::{ArtifactStore, content_type_for};
use crate::error::{
    ApiError, translate_artifact_error, translate_audit_error, translate_core_error,
    translate_domain_error, translate_persistence_error,
};
use crate::request_response::{
    ActivityQuery, CreateSessionRequest, DownloadResponse, EndSessionRequest, RecordAuditRequest,
    SessionFile, SessionFilePathResponse, SessionListQuery, UpdateFilePathRequest,
};

// ============================================================================
// Write path
// ============================================================================

/// Records one result mutation in the snapshot store.
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] if the action, a snapshot, the data
/// presence rule or the actor is invalid; nothing is written in that case.
/// Returns [`ApiError::AuditWriteFailed`] if the store rejects the row.
pub fn record(
    persistence: &mut Persistence,
    request: RecordAuditRequest,
    now: OffsetDateTime,
) -> Result<AuditEntry, ApiError> {
    let action: AuditAction = request.action.parse().map_err(translate_domain_error)?;
    let record = NewAuditEntry {
        action,
        result_id: request.result_id,
        session_id: request.session_id,
        old_data: decode_snapshot(request.old_data, "oldData")?,
        new_data: decode_snapshot(request.new_data, "newData")?,
        user_id: request.user_id,
        ip_address: request.ip_address,
    };

    let entry: AuditEntry = AuditEntry::new(record, now).map_err(translate_audit_error)?;
    let audit_entry_id: i64 = persistence
        .insert_audit_entry(&entry)
        .map_err(write_failure("record"))?;

    Ok(entry.with_id(audit_entry_id))
}

/// Opens an entry session.
///
/// # Errors
///
/// Returns an error if the entry method is unknown, an id is blank, or the
/// store rejects the row.
pub fn create_session(
    persistence: &mut Persistence,
    request: CreateSessionRequest,
    now: OffsetDateTime,
) -> Result<EntrySession, ApiError> {
    let entry_method: EntryMethod = request.entry_method.parse().map_err(translate_domain_error)?;
    let params = NewEntrySession {
        event_id: request.event_id,
        user_id: request.user_id,
        entry_method,
        format: request.format,
        file_path: request.file_path,
        original_filename: request.original_filename,
    };
    params.validate().map_err(translate_audit_error)?;

    persistence
        .create_entry_session(&params, now)
        .map_err(write_failure("create_session"))
}

/// Closes an entry session with its final result count.
///
/// Closing an unknown or already closed session is not an error; the
/// returned [`SessionClosure`] says what happened.
///
/// # Errors
///
/// Returns an error if the count is negative or the store update fails.
pub fn end_session(
    persistence: &mut Persistence,
    session_id: i64,
    request: EndSessionRequest,
    now: OffsetDateTime,
) -> Result<SessionClosure, ApiError> {
    validate_result_count(request.result_count).map_err(translate_audit_error)?;

    persistence
        .close_entry_session(session_id, request.result_count, now)
        .map_err(write_failure("end_session"))
}

/// Links an artifact path to a session.
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] for an unknown session and
/// [`ApiError::InvalidInput`] for a blank path or once the attach window
/// after closure has passed.
pub fn update_file_path(
    persistence: &mut Persistence,
    session_id: i64,
    request: &UpdateFilePathRequest,
    now: OffsetDateTime,
) -> Result<EntrySession, ApiError> {
    let file_path: &str = request.file_path.trim();
    if file_path.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("filePath"),
            message: String::from("filePath must not be empty"),
        });
    }

    let mut session: EntrySession = load_session(persistence, session_id)?;
    session.check_artifact_window(now).map_err(translate_audit_error)?;

    persistence
        .set_session_file_path(session_id, file_path)
        .map_err(write_failure("update_file_path"))?;
    session.file_path = Some(file_path.to_string());

    Ok(session)
}

/// Saves an uploaded spreadsheet and links it to its session.
///
/// Composes [`begin_artifact_attach`], [`ArtifactStore::save_uploaded_file`]
/// and [`link_upload`].
///
/// # Errors
///
/// Returns an error if the session is unknown, its attach window has
/// passed, the file cannot be written, or the link cannot be stored.
pub fn attach_upload(
    persistence: &mut Persistence,
    store: &ArtifactStore,
    session_id: i64,
    bytes: &[u8],
    original_filename: &str,
    now: OffsetDateTime,
) -> Result<EntrySession, ApiError> {
    let session: EntrySession = begin_artifact_attach(persistence, session_id, now)?;
    let path: PathBuf = store
        .save_uploaded_file(bytes, original_filename, &session.event_id, session_id, now)
        .map_err(translate_artifact_error)?;
    link_upload(persistence, session, &path, original_filename)
}

/// Loads a session that may still take an artifact.
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] for an unknown session and
/// [`ApiError::InvalidInput`] once the attach window after closure has
/// passed.
pub fn begin_artifact_attach(
    persistence: &mut Persistence,
    session_id: i64,
    now: OffsetDateTime,
) -> Result<EntrySession, ApiError> {
    let session: EntrySession = load_session(persistence, session_id)?;
    session.check_artifact_window(now).map_err(translate_audit_error)?;
    Ok(session)
}

/// Links a saved upload to its session.
///
/// The client's filename, without any directory part, is stored when the
/// session was opened without one.
///
/// # Errors
///
/// Returns [`ApiError::AuditWriteFailed`] if the link cannot be stored.
pub fn link_upload(
    persistence: &mut Persistence,
    mut session: EntrySession,
    path: &Path,
    original_filename: &str,
) -> Result<EntrySession, ApiError> {
    let session_id: i64 = session.id;
    let file_path: String = path.to_string_lossy().into_owned();
    let client_name: Option<String> = Path::new(original_filename.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .filter(|name| !name.is_empty());

    let named: bool = persistence
        .transaction(|p| -> Result<bool, PersistenceError> {
            p.set_session_file_path(session_id, &file_path)?;
            match client_name.as_deref() {
                Some(name) => p.set_session_original_filename(session_id, name),
                None => Ok(false),
            }
        })
        .map_err(write_failure("attach_upload"))?;

    session.file_path = Some(file_path);
    if named {
        session.original_filename = client_name;
    }
    Ok(session)
}

/// Finishes a manual-entry run: writes the snapshot spreadsheet, links it,
/// and closes the session with the number of rows entered.
///
/// Composes [`begin_artifact_attach`], [`ArtifactStore::generate_snapshot`]
/// and [`finish_manual_entry`].
///
/// # Errors
///
/// Returns an error if the session is unknown, its attach window has
/// passed, or the spreadsheet or store writes fail.
pub fn complete_manual_entry(
    persistence: &mut Persistence,
    store: &ArtifactStore,
    session_id: i64,
    rows: &[Snapshot],
    now: OffsetDateTime,
) -> Result<SessionClosure, ApiError> {
    let session: EntrySession = begin_artifact_attach(persistence, session_id, now)?;
    let path: PathBuf = store
        .generate_snapshot(&session.event_id, session_id, rows, now)
        .map_err(translate_artifact_error)?;
    finish_manual_entry(persistence, session_id, &path, rows.len(), now)
}

/// Links a generated snapshot to its session and closes the session with
/// `row_count` results.
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] if the count does not fit, or
/// [`ApiError::AuditWriteFailed`] if the store writes fail.
pub fn finish_manual_entry(
    persistence: &mut Persistence,
    session_id: i64,
    path: &Path,
    row_count: usize,
    now: OffsetDateTime,
) -> Result<SessionClosure, ApiError> {
    let result_count: i64 = i64::try_from(row_count).map_err(|_| ApiError::InvalidInput {
        field: String::from("rows"),
        message: format!("Too many rows: {row_count}"),
    })?;

    let file_path: String = path.to_string_lossy().into_owned();
    let closure: SessionClosure = persistence
        .transaction(|p| -> Result<SessionClosure, PersistenceError> {
            p.set_session_file_path(session_id, &file_path)?;
            p.close_entry_session(session_id, result_count, now)
        })
        .map_err(write_failure("complete_manual_entry"))?;

    info!(session_id, result_count, "Completed manual entry session");
    Ok(closure)
}

// ============================================================================
// Read path
// ============================================================================

/// Fetches one audit entry with its actor resolved.
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] if no entry has this id.
pub fn get_audit_log_by_id(
    persistence: &mut Persistence,
    audit_entry_id: i64,
) -> Result<AuditLogView, ApiError> {
    let entry: AuditEntry = persistence
        .get_audit_entry(audit_entry_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| translate_persistence_error(PersistenceError::AuditEntryNotFound(audit_entry_id)))?;

    let directory: Directory = load_directory(persistence);
    Ok(AuditLogView::new(entry, &directory))
}

/// Lists every entry of a session, oldest first.
pub fn get_session_audit_logs(persistence: &mut Persistence, session_id: i64) -> Vec<AuditLogView> {
    let entries: Vec<AuditEntry> =
        load_or_empty(persistence.list_session_entries(session_id), "session entries");
    let directory: Directory = load_directory(persistence);

    entries
        .into_iter()
        .map(|entry| AuditLogView::new(entry, &directory))
        .collect()
}

/// Builds one page of the activity feed.
///
/// # Errors
///
/// Returns [`ApiError::InvalidInput`] for an unknown `actionType`.
pub fn list_activity(
    persistence: &mut Persistence,
    query: &ActivityQuery,
    now: OffsetDateTime,
) -> Result<ActivityPage, ApiError> {
    let filter: ActivityFilter = activity_filter(query)?;
    let directory: Directory = load_directory(persistence);

    let scope: Option<Vec<String>> = filter.event_id.as_ref().map_or_else(
        || {
            filter
                .season_id
                .as_deref()
                .map(|season_id| directory.event_ids_in_season(season_id).into_iter().collect())
        },
        |event_id| Some(vec![event_id.clone()]),
    );
    if scope.as_ref().is_some_and(Vec::is_empty) {
        return Ok(ActivityPage::default());
    }

    let sessions: Vec<EntrySession> =
        load_or_empty(persistence.list_entry_sessions(scope.as_deref()), "entry sessions");
    let session_ids: Vec<i64> = sessions.iter().map(|session| session.id).collect();
    let create_logs: Vec<AuditEntry> =
        load_or_empty(persistence.list_create_entries(&session_ids), "create entries");
    let change_logs: Vec<AuditEntry> =
        load_or_empty(persistence.list_change_entries(), "change entries");

    let inputs = ActivityInputs {
        sessions: &sessions,
        create_logs: &create_logs,
        change_logs: &change_logs,
        directory: &directory,
        as_of: now,
    };
    Ok(tally::list_activity(&inputs, &filter))
}

/// Lists the entry sessions of an event with their created results.
pub fn get_event_sessions(
    persistence: &mut Persistence,
    event_id: &str,
    now: OffsetDateTime,
) -> Vec<SessionSummary> {
    let scope: [String; 1] = [event_id.to_string()];
    summaries_for(persistence, Some(scope.as_slice()), now)
}

/// Lists updates touching an event, newest first.
pub fn get_event_modifications(persistence: &mut Persistence, event_id: &str) -> Vec<AuditLogView> {
    event_logs_for(persistence, AuditAction::Update, event_id)
}

/// Lists deletions of an event's results, newest first.
pub fn get_event_deletions(persistence: &mut Persistence, event_id: &str) -> Vec<AuditLogView> {
    event_logs_for(persistence, AuditAction::Delete, event_id)
}

/// Imports, modifications and deletions of an event in one response.
pub fn get_event_all_logs(
    persistence: &mut Persistence,
    event_id: &str,
    now: OffsetDateTime,
) -> EventLogs {
    EventLogs {
        imports: get_event_sessions(persistence, event_id, now),
        modifications: get_event_modifications(persistence, event_id),
        deletions: get_event_deletions(persistence, event_id),
    }
}

/// Pages every entry session, optionally scoped to an event and searched by
/// actor or event title.
pub fn list_all_sessions(
    persistence: &mut Persistence,
    query: &SessionListQuery,
    now: OffsetDateTime,
) -> SessionPage {
    let scope: Option<Vec<String>> = query.event_id.clone().map(|event_id| vec![event_id]);
    let summaries: Vec<SessionSummary> = summaries_for(persistence, scope.as_deref(), now);
    page_sessions(summaries, query.search.as_deref(), query.limit, query.offset)
}

// ============================================================================
// Download
// ============================================================================

/// Reports the artifact path linked to a session; `None` for an unknown
/// session or one without a file.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] if the session cannot be read.
pub fn get_session_file_path(
    persistence: &mut Persistence,
    session_id: i64,
) -> Result<SessionFilePathResponse, ApiError> {
    let session: Option<EntrySession> = persistence
        .get_entry_session(session_id)
        .map_err(translate_persistence_error)?;
    if session.is_none() {
        warn!(session_id, "File path requested for unknown session");
    }

    Ok(SessionFilePathResponse {
        session_id,
        file_path: session.and_then(|s| s.file_path),
    })
}

/// Loads a session's artifact for download.
///
/// Composes [`resolve_session_file`] and [`stream_session_file`].
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] if there is nothing to serve, or
/// [`ApiError::ArtifactIo`] if the file exists but cannot be read.
pub fn resolve_and_stream(
    persistence: &mut Persistence,
    store: &ArtifactStore,
    session_id: i64,
) -> Result<DownloadResponse, ApiError> {
    let file: SessionFile = resolve_session_file(persistence, session_id)?;
    stream_session_file(store, &file)
}

/// Looks up which file a session's download serves and under what name.
///
/// An unknown session and a session without a file are logged separately
/// and both reported as not found.
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] as above.
pub fn resolve_session_file(
    persistence: &mut Persistence,
    session_id: i64,
) -> Result<SessionFile, ApiError> {
    let Some(session) = persistence
        .get_entry_session(session_id)
        .map_err(translate_persistence_error)?
    else {
        warn!(session_id, "Download requested for unknown session");
        return Err(session_file_not_found());
    };

    let Some(file_path) = session.file_path else {
        warn!(session_id, "Download requested for session without a file");
        return Err(session_file_not_found());
    };

    let path: PathBuf = PathBuf::from(file_path);
    let filename: String = session
        .original_filename
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("session_{session_id}"));

    Ok(SessionFile {
        session_id,
        path,
        filename,
    })
}

/// Reads a resolved session file from the store.
///
/// A file that is gone or lies outside the store root is reported as not
/// found.
///
/// # Errors
///
/// Returns [`ApiError::ResourceNotFound`] as above, or
/// [`ApiError::ArtifactIo`] if the file exists but cannot be read.
pub fn stream_session_file(
    store: &ArtifactStore,
    file: &SessionFile,
) -> Result<DownloadResponse, ApiError> {
    let bytes: Vec<u8> = store.read(&file.path).map_err(|err| {
        warn!(session_id = file.session_id, error = %err, "Session file could not be read");
        translate_artifact_error(err)
    })?;

    Ok(DownloadResponse {
        bytes,
        filename: file.filename.clone(),
        content_type: content_type_for(&file.path),
    })
}

// ============================================================================
// Helpers
// ============================================================================

fn decode_snapshot(value: Option<Value>, field: &str) -> Result<Option<Snapshot>, ApiError> {
    value
        .filter(|v| !v.is_null())
        .map(|v| {
            Snapshot::from_value(v).map_err(|err| ApiError::InvalidInput {
                field: field.to_string(),
                message: err.to_string(),
            })
        })
        .transpose()
}

fn activity_filter(query: &ActivityQuery) -> Result<ActivityFilter, ApiError> {
    let action_type: Option<ActivityType> = match query.action_type.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(value) => Some(value.parse().map_err(translate_core_error)?),
    };

    Ok(ActivityFilter {
        limit: query.limit,
        offset: query.offset,
        search: query.search.clone(),
        season_id: query.season_id.clone().filter(|s| !s.is_empty()),
        event_id: query.event_id.clone().filter(|s| !s.is_empty()),
        action_type,
    })
}

fn write_failure(operation: &'static str) -> impl FnOnce(PersistenceError) -> ApiError {
    move |err| {
        error!(operation, error = %err, "Audit trail write failed");
        ApiError::AuditWriteFailed {
            message: err.to_string(),
        }
    }
}

fn load_session(persistence: &mut Persistence, session_id: i64) -> Result<EntrySession, ApiError> {
    persistence
        .get_entry_session(session_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| translate_persistence_error(PersistenceError::SessionNotFound(session_id)))
}

fn load_directory(persistence: &mut Persistence) -> Directory {
    persistence.load_directory().unwrap_or_else(|err| {
        error!(error = %err, "Failed to load directory; names will fall back");
        Directory::default()
    })
}

fn load_or_empty<T>(result: Result<Vec<T>, PersistenceError>, what: &'static str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        error!(source = what, error = %err, "Read failed; treating as empty");
        Vec::new()
    })
}

fn summaries_for(
    persistence: &mut Persistence,
    scope: Option<&[String]>,
    now: OffsetDateTime,
) -> Vec<SessionSummary> {
    let sessions: Vec<EntrySession> =
        load_or_empty(persistence.list_entry_sessions(scope), "entry sessions");
    let session_ids: Vec<i64> = sessions.iter().map(|session| session.id).collect();
    let create_logs: Vec<AuditEntry> =
        load_or_empty(persistence.list_create_entries(&session_ids), "create entries");
    let directory: Directory = load_directory(persistence);

    summarize_sessions(&sessions, &create_logs, &directory, now)
}

fn event_logs_for(
    persistence: &mut Persistence,
    action: AuditAction,
    event_id: &str,
) -> Vec<AuditLogView> {
    let entries: Vec<AuditEntry> =
        load_or_empty(persistence.list_entries_by_action(action), "event entries");
    let directory: Directory = load_directory(persistence);
    event_log_views(entries, action, event_id, &directory)
}

fn session_file_not_found() -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Session file"),
        message: String::from("No file is available for this session"),
    }
}
