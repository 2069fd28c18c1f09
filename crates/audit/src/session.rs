// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::AuditError;
use serde::{Deserialize, Serialize};
use tally_domain::EntryMethod;
use time::{Duration, OffsetDateTime};

/// How long a session may stay open before the feed flags it as incomplete.
pub const OPEN_SESSION_GRACE: Duration = Duration::hours(1);

/// How long after closing a session its file path may still be attached.
pub const ARTIFACT_ATTACH_GRACE: Duration = Duration::minutes(15);

/// Parameters for opening an entry session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntrySession {
    pub event_id: String,
    pub user_id: String,
    pub entry_method: EntryMethod,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

impl NewEntrySession {
    /// # Errors
    ///
    /// Returns an error if the event or user id is blank.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.event_id.trim().is_empty() {
            return Err(AuditError::EmptyField { field: "eventId" });
        }
        if self.user_id.trim().is_empty() {
            return Err(AuditError::EmptyField { field: "userId" });
        }
        Ok(())
    }
}

/// A bounded batch of result mutations, such as one spreadsheet import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntrySession {
    pub id: i64,
    pub event_id: String,
    pub user_id: String,
    pub entry_method: EntryMethod,
    pub format: Option<String>,
    pub file_path: Option<String>,
    pub original_filename: Option<String>,
    pub result_count: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub session_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub session_end: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl EntrySession {
    /// A freshly opened session as the store creates it.
    #[must_use]
    pub fn open(id: i64, params: NewEntrySession, now: OffsetDateTime) -> Self {
        Self {
            id,
            event_id: params.event_id,
            user_id: params.user_id,
            entry_method: params.entry_method,
            format: params.format,
            file_path: params.file_path,
            original_filename: params.original_filename,
            result_count: 0,
            session_start: now,
            session_end: None,
            created_at: now,
        }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.session_end.is_none()
    }

    /// An open session observed past [`OPEN_SESSION_GRACE`].
    ///
    /// Such sessions are never closed automatically.
    #[must_use]
    pub fn is_incomplete(&self, now: OffsetDateTime) -> bool {
        self.is_open() && now - self.session_start > OPEN_SESSION_GRACE
    }

    /// Checks whether a file path may still be attached at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::ArtifactWindowClosed`] once the session has been
    /// closed for longer than [`ARTIFACT_ATTACH_GRACE`].
    pub fn check_artifact_window(&self, now: OffsetDateTime) -> Result<(), AuditError> {
        match self.session_end {
            Some(closed_at) if now - closed_at > ARTIFACT_ATTACH_GRACE => {
                Err(AuditError::ArtifactWindowClosed {
                    session_id: self.id,
                    closed_at,
                })
            }
            _ => Ok(()),
        }
    }
}

/// Checks the final count handed to a session closure.
///
/// # Errors
///
/// Returns [`AuditError::NegativeResultCount`] for counts below zero.
pub const fn validate_result_count(count: i64) -> Result<(), AuditError> {
    if count < 0 {
        return Err(AuditError::NegativeResultCount { count });
    }
    Ok(())
}

/// Outcome of an attempt to close a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionClosure {
    /// The session was open and is now closed with this count.
    Closed {
        #[serde(rename = "resultCount")]
        result_count: i64,
    },
    /// The session was already closed; its original count is kept.
    AlreadyClosed {
        #[serde(rename = "resultCount")]
        result_count: i64,
    },
    /// No session has this id.
    NotFound,
}
