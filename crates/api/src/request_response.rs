// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API request to record one result mutation.
///
/// Snapshots arrive as raw JSON so a non-object can be reported as invalid
/// input rather than a decoding failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordAuditRequest {
    /// `create`, `update` or `delete`.
    pub action: String,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub old_data: Option<Value>,
    #[serde(default)]
    pub new_data: Option<Value>,
    pub user_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

/// API request to open an entry session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub event_id: String,
    pub user_id: String,
    /// `manual`, `excel` or `termlab`.
    pub entry_method: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

/// API request to close an entry session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub result_count: i64,
}

/// API request to link an artifact path to a session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFilePathRequest {
    pub file_path: String,
}

/// Query parameters of the activity feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub season_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    /// `new_entry`, `modification`, `deletion` or `all`.
    #[serde(default)]
    pub action_type: Option<String>,
}

/// Query parameters of the session listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// API response naming a session's artifact, if it has one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilePathResponse {
    pub session_id: i64,
    pub file_path: Option<String>,
}

/// The file a session's download serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub session_id: i64,
    /// Path as linked to the session; resolved against the store root on read.
    pub path: PathBuf,
    /// Name offered to the client: the original upload name when known.
    pub filename: String,
}

/// A resolved session artifact ready to stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub bytes: Vec<u8>,
    /// Name offered to the client: the original upload name when known.
    pub filename: String,
    pub content_type: &'static str,
}
