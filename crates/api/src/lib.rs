// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service boundary of the results audit trail.
//!
//! Handlers here take the persistence adapter and an explicit `now`, and
//! translate every lower-layer error into an [`ApiError`].

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

mod artifacts;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use artifacts::{ArtifactError, ArtifactStore, SNAPSHOT_HEADERS, content_type_for, sanitize_component};
pub use error::{
    ApiError, translate_artifact_error, translate_audit_error, translate_core_error,
    translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    attach_upload, begin_artifact_attach, complete_manual_entry, create_session, end_session,
    finish_manual_entry, get_audit_log_by_id, get_event_all_logs, get_event_deletions,
    get_event_modifications, get_event_sessions, get_session_audit_logs, get_session_file_path,
    link_upload, list_activity, list_all_sessions, record, resolve_and_stream,
    resolve_session_file, stream_session_file, update_file_path,
};
pub use request_response::{
    ActivityQuery, CreateSessionRequest, DownloadResponse, EndSessionRequest, RecordAuditRequest,
    SessionFile, SessionFilePathResponse, SessionListQuery, UpdateFilePathRequest,
};
