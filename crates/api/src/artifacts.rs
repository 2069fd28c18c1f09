// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! On-disk artifacts linked to entry sessions.
//!
//! Layout under the store root:
//!
//! - `uploads/<eventId>/<sessionId>_<timestamp>.<ext>` for uploaded spreadsheets
//! - `sessions/<eventId>/manual_<sessionId>_<timestamp>.csv` for generated
//!   snapshots of manually entered rows
//!
//! Writing a file is not transactional with the session row that points at
//! it. A dangling path is reported as missing when it is read back.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tally_domain::Snapshot;
use tally_domain::snapshot::{COMPETITION_CLASS, COMPETITOR_NAME, FORMAT, MECA_ID, SCORE};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{debug, info, warn};

/// Column headers of a generated manual-entry snapshot.
pub const SNAPSHOT_HEADERS: [&str; 11] = [
    "Member ID",
    "Name",
    "Class",
    "Format",
    "Score",
    "Placement",
    "Points",
    "Wattage",
    "Frequency",
    "Vehicle Info",
    "Notes",
];

/// Snapshot keys feeding each column, in header order.
const SNAPSHOT_COLUMNS: [&str; 11] = [
    MECA_ID,
    COMPETITOR_NAME,
    COMPETITION_CLASS,
    FORMAT,
    SCORE,
    "placement",
    "points_earned",
    "wattage",
    "frequency",
    "vehicle_info",
    "notes",
];

const FILE_TIMESTAMP: &[BorrowedFormatItem<'_>] = format_description!(
    "[year]-[month]-[day]T[hour]-[minute]-[second]-[subsecond digits:3]Z"
);

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact file {path} does not exist")]
    Missing { path: String },

    #[error("artifact I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot spreadsheet: {0}")]
    Csv(#[from] csv::Error),
}

impl ArtifactError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        let path: String = path.display().to_string();
        if source.kind() == ErrorKind::NotFound {
            Self::Missing { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// File store rooted at a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes uploaded bytes and returns the new file's path.
    ///
    /// The extension of `original_filename` is kept, sanitized.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the file cannot be written.
    pub fn save_uploaded_file(
        &self,
        bytes: &[u8],
        original_filename: &str,
        event_id: &str,
        session_id: i64,
        now: OffsetDateTime,
    ) -> Result<PathBuf, ArtifactError> {
        let dir: PathBuf = self.root.join("uploads").join(sanitize_component(event_id));
        fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

        let extension: String = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(sanitize_component)
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let path: PathBuf = dir.join(format!(
            "{session_id}_{}{extension}",
            file_timestamp(now)
        ));

        fs::write(&path, bytes).map_err(|e| ArtifactError::io(&path, e))?;
        info!(session_id, path = %path.display(), size = bytes.len(), "Saved uploaded artifact");
        Ok(path)
    }

    /// Writes a spreadsheet of manually entered rows and returns its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the spreadsheet cannot be written.
    pub fn generate_snapshot(
        &self,
        event_id: &str,
        session_id: i64,
        rows: &[Snapshot],
        now: OffsetDateTime,
    ) -> Result<PathBuf, ArtifactError> {
        let dir: PathBuf = self.root.join("sessions").join(sanitize_component(event_id));
        fs::create_dir_all(&dir).map_err(|e| ArtifactError::io(&dir, e))?;

        let path: PathBuf = dir.join(format!("manual_{session_id}_{}.csv", file_timestamp(now)));
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(SNAPSHOT_HEADERS)?;
        for row in rows {
            writer.write_record(SNAPSHOT_COLUMNS.iter().map(|key| snapshot_cell(row, key)))?;
        }
        writer.flush().map_err(|e| ArtifactError::io(&path, e))?;

        info!(session_id, path = %path.display(), rows = rows.len(), "Generated manual entry snapshot");
        Ok(path)
    }

    /// Reads an artifact back.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Missing`] if the file is gone or lies outside
    /// the store root.
    pub fn read(&self, path: &Path) -> Result<Vec<u8>, ArtifactError> {
        let resolved: PathBuf = self.resolve(path)?;
        debug!(path = %resolved.display(), "Reading artifact");
        fs::read(&resolved).map_err(|e| ArtifactError::io(path, e))
    }

    /// Resolves a linked path to an existing file under the store root.
    ///
    /// Relative paths that do not already start with the root are taken
    /// relative to it. Links and `..` components are followed before the
    /// containment check.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::Missing`] if the file does not exist or
    /// resolves outside the root.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf, ArtifactError> {
        let candidate: PathBuf = if path.is_absolute() || path.starts_with(&self.root) {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let root: PathBuf = fs::canonicalize(&self.root).map_err(|e| ArtifactError::io(&self.root, e))?;
        let resolved: PathBuf = fs::canonicalize(&candidate).map_err(|e| ArtifactError::io(path, e))?;
        if !resolved.starts_with(&root) || !resolved.is_file() {
            warn!(
                root = %root.display(),
                path = %path.display(),
                "Linked artifact is not a file inside the store root"
            );
            return Err(ArtifactError::Missing {
                path: path.display().to_string(),
            });
        }
        Ok(resolved)
    }
}

/// Replaces anything outside `[A-Za-z0-9_-]` with `_`.
#[must_use]
pub fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        String::from("unknown")
    } else {
        cleaned
    }
}

/// Content type advertised for a download, by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension: Option<String> = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

fn file_timestamp(now: OffsetDateTime) -> String {
    now.to_offset(time::UtcOffset::UTC)
        .format(FILE_TIMESTAMP)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

fn snapshot_cell(row: &Snapshot, key: &str) -> String {
    row.text(key).unwrap_or_default()
}
