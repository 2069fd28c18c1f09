// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::AuditError;
use serde::{Deserialize, Serialize};
use tally_domain::{AuditAction, Snapshot};
use time::OffsetDateTime;

/// The caller-supplied part of an audit entry.
///
/// Everything except the row id and the timestamp, which the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEntry {
    pub action: AuditAction,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub old_data: Option<Snapshot>,
    #[serde(default)]
    pub new_data: Option<Snapshot>,
    pub user_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl NewAuditEntry {
    /// Checks the snapshot presence rule for this entry's action.
    ///
    /// `create` carries only `new_data`, `delete` only `old_data`, and
    /// `update` both. The actor must be named.
    ///
    /// # Errors
    ///
    /// Returns the first rule the entry violates.
    pub fn validate(&self) -> Result<(), AuditError> {
        let action: AuditAction = self.action;

        match (action.requires_old_data(), self.old_data.is_some()) {
            (true, false) => return Err(AuditError::MissingOldData { action }),
            (false, true) => return Err(AuditError::UnexpectedOldData { action }),
            _ => {}
        }

        match (action.requires_new_data(), self.new_data.is_some()) {
            (true, false) => return Err(AuditError::MissingNewData { action }),
            (false, true) => return Err(AuditError::UnexpectedNewData { action }),
            _ => {}
        }

        if self.user_id.trim().is_empty() {
            return Err(AuditError::EmptyField { field: "userId" });
        }

        Ok(())
    }
}

/// One immutable row of the snapshot store.
///
/// There are no setters. An entry is built once, either from a validated
/// [`NewAuditEntry`] at write time or restored from a stored row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    id: Option<i64>,
    session_id: Option<i64>,
    result_id: Option<String>,
    action: AuditAction,
    old_data: Option<Snapshot>,
    new_data: Option<Snapshot>,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    user_id: String,
    ip_address: Option<String>,
}

impl AuditEntry {
    /// Builds an unsaved entry stamped at `timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry violates the snapshot presence rule.
    pub fn new(record: NewAuditEntry, timestamp: OffsetDateTime) -> Result<Self, AuditError> {
        record.validate()?;
        Ok(Self::from_record(None, record, timestamp))
    }

    /// Rebuilds an entry read back from the store.
    ///
    /// Stored rows are evidence and are not re-validated.
    #[must_use]
    pub fn restore(id: i64, record: NewAuditEntry, timestamp: OffsetDateTime) -> Self {
        Self::from_record(Some(id), record, timestamp)
    }

    /// Returns this entry with the id assigned by the store.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    fn from_record(id: Option<i64>, record: NewAuditEntry, timestamp: OffsetDateTime) -> Self {
        Self {
            id,
            session_id: record.session_id,
            result_id: record.result_id,
            action: record.action,
            old_data: record.old_data,
            new_data: record.new_data,
            timestamp,
            user_id: record.user_id,
            ip_address: record.ip_address,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<i64> {
        self.id
    }

    #[must_use]
    pub const fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    #[must_use]
    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    #[must_use]
    pub const fn old_data(&self) -> Option<&Snapshot> {
        self.old_data.as_ref()
    }

    #[must_use]
    pub const fn new_data(&self) -> Option<&Snapshot> {
        self.new_data.as_ref()
    }

    #[must_use]
    pub const fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// The event the mutated record belonged to.
    ///
    /// Read from the before-snapshot first, then the after-snapshot.
    #[must_use]
    pub fn event_id(&self) -> Option<String> {
        self.old_data
            .as_ref()
            .and_then(Snapshot::event_id)
            .or_else(|| self.new_data.as_ref().and_then(Snapshot::event_id))
    }

    /// The snapshot that best describes the record: after if present, else before.
    #[must_use]
    pub fn subject(&self) -> Option<&Snapshot> {
        self.new_data.as_ref().or(self.old_data.as_ref())
    }
}
