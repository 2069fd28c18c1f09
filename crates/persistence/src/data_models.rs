// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row shapes and their conversion into domain values.

use diesel::prelude::*;
use tally::{EventInfo, ProfileInfo, SeasonInfo};
use tally_audit::{AuditEntry, EntrySession, NewAuditEntry};
use tally_domain::{AuditAction, EntryMethod, Snapshot};
use tracing::warn;

use crate::diesel_schema::{audit_entries, entry_sessions, events, profiles, seasons};
use crate::error::PersistenceError;
use crate::timestamps::{parse_date, parse_timestamp};

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = audit_entries)]
pub struct AuditEntryRow {
    pub audit_entry_id: i64,
    pub session_id: Option<i64>,
    pub result_id: Option<String>,
    pub action: String,
    pub old_data: Option<String>,
    pub new_data: Option<String>,
    pub recorded_at: String,
    pub user_id: String,
    pub ip_address: Option<String>,
}

impl AuditEntryRow {
    /// # Errors
    ///
    /// Returns an error if the action, a snapshot, or the timestamp is malformed.
    pub fn into_entry(self) -> Result<AuditEntry, PersistenceError> {
        let action: AuditAction = self.action.parse()?;
        let old_data: Option<Snapshot> = self.old_data.as_deref().map(Snapshot::parse).transpose()?;
        let new_data: Option<Snapshot> = self.new_data.as_deref().map(Snapshot::parse).transpose()?;
        let timestamp = parse_timestamp(&self.recorded_at)?;

        Ok(AuditEntry::restore(
            self.audit_entry_id,
            NewAuditEntry {
                action,
                result_id: self.result_id,
                session_id: self.session_id,
                old_data,
                new_data,
                user_id: self.user_id,
                ip_address: self.ip_address,
            },
            timestamp,
        ))
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = entry_sessions)]
pub struct EntrySessionRow {
    pub session_id: i64,
    pub event_id: String,
    pub user_id: String,
    pub entry_method: String,
    pub format: Option<String>,
    pub file_path: Option<String>,
    pub original_filename: Option<String>,
    pub result_count: i64,
    pub session_start: String,
    pub session_end: Option<String>,
    pub created_at: String,
}

impl EntrySessionRow {
    /// # Errors
    ///
    /// Returns an error if the entry method or a timestamp is malformed.
    pub fn into_session(self) -> Result<EntrySession, PersistenceError> {
        let entry_method: EntryMethod = self.entry_method.parse()?;
        Ok(EntrySession {
            id: self.session_id,
            event_id: self.event_id,
            user_id: self.user_id,
            entry_method,
            format: self.format,
            file_path: self.file_path,
            original_filename: self.original_filename,
            result_count: self.result_count,
            session_start: parse_timestamp(&self.session_start)?,
            session_end: self.session_end.as_deref().map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = events)]
pub struct EventRow {
    pub event_id: String,
    pub title: String,
    pub event_date: Option<String>,
    pub season_id: Option<String>,
}

impl From<EventRow> for EventInfo {
    fn from(row: EventRow) -> Self {
        let event_date = row.event_date.as_deref().and_then(|text| {
            parse_date(text)
                .inspect_err(|err| warn!(event_id = %row.event_id, error = %err, "Ignoring event date"))
                .ok()
        });
        Self {
            event_id: row.event_id,
            title: row.title,
            event_date,
            season_id: row.season_id,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = seasons)]
pub struct SeasonRow {
    pub season_id: String,
    pub name: String,
}

impl From<SeasonRow> for SeasonInfo {
    fn from(row: SeasonRow) -> Self {
        Self {
            season_id: row.season_id,
            name: row.name,
        }
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = profiles)]
pub struct ProfileRow {
    pub profile_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub meca_id: Option<String>,
    pub membership_status: Option<String>,
}

impl From<ProfileRow> for ProfileInfo {
    fn from(row: ProfileRow) -> Self {
        Self {
            profile_id: row.profile_id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            meca_id: row.meca_id,
            membership_status: row.membership_status,
        }
    }
}

/// Decodes audit rows, skipping any that are malformed.
pub fn decode_audit_rows(rows: Vec<AuditEntryRow>) -> Vec<AuditEntry> {
    rows.into_iter()
        .filter_map(|row| {
            let audit_entry_id: i64 = row.audit_entry_id;
            row.into_entry()
                .inspect_err(|err| {
                    warn!(audit_entry_id, error = %err, "Skipping malformed audit entry");
                })
                .ok()
        })
        .collect()
}

/// Decodes session rows, skipping any that are malformed.
pub fn decode_session_rows(rows: Vec<EntrySessionRow>) -> Vec<EntrySession> {
    rows.into_iter()
        .filter_map(|row| {
            let session_id: i64 = row.session_id;
            row.into_session()
                .inspect_err(|err| {
                    warn!(session_id, error = %err, "Skipping malformed entry session");
                })
                .ok()
        })
        .collect()
}
