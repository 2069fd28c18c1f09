// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally_audit::AuditEntry;
use tally_domain::AuditAction;
use tracing::debug;

use crate::data_models::{AuditEntryRow, decode_audit_rows};
use crate::diesel_schema::audit_entries;
use crate::error::PersistenceError;

backend_fn! {
/// Fetches a single audit entry by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_audit_entry(conn: &mut _, audit_entry_id: i64) -> Result<Option<AuditEntry>, PersistenceError> {
    let row: Option<AuditEntryRow> = audit_entries::table
        .filter(audit_entries::audit_entry_id.eq(audit_entry_id))
        .select(AuditEntryRow::as_select())
        .first::<AuditEntryRow>(conn)
        .optional()?;

    row.map(AuditEntryRow::into_entry).transpose()
}
}

backend_fn! {
/// Lists a session's entries, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_session_entries(conn: &mut _, session_id: i64) -> Result<Vec<AuditEntry>, PersistenceError> {
    let rows: Vec<AuditEntryRow> = audit_entries::table
        .filter(audit_entries::session_id.eq(session_id))
        .order((audit_entries::recorded_at.asc(), audit_entries::audit_entry_id.asc()))
        .select(AuditEntryRow::as_select())
        .load(conn)?;

    debug!(session_id, count = rows.len(), "Loaded session audit entries");
    Ok(decode_audit_rows(rows))
}
}

backend_fn! {
/// Lists the `create` entries belonging to any of the given sessions.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_create_entries(conn: &mut _, session_ids: &[i64]) -> Result<Vec<AuditEntry>, PersistenceError> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<AuditEntryRow> = audit_entries::table
        .filter(audit_entries::action.eq(AuditAction::Create.as_str()))
        .filter(audit_entries::session_id.eq_any(session_ids.to_vec()))
        .order((audit_entries::recorded_at.asc(), audit_entries::audit_entry_id.asc()))
        .select(AuditEntryRow::as_select())
        .load(conn)?;

    Ok(decode_audit_rows(rows))
}
}

backend_fn! {
/// Lists every entry whose action is one of `actions`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_entries_by_actions(conn: &mut _, actions: &[AuditAction]) -> Result<Vec<AuditEntry>, PersistenceError> {
    let names: Vec<&'static str> = actions.iter().map(AuditAction::as_str).collect();

    let rows: Vec<AuditEntryRow> = audit_entries::table
        .filter(audit_entries::action.eq_any(names))
        .order((audit_entries::recorded_at.desc(), audit_entries::audit_entry_id.desc()))
        .select(AuditEntryRow::as_select())
        .load(conn)?;

    Ok(decode_audit_rows(rows))
}
}
