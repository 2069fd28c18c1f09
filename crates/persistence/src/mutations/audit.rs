// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Snapshot store writes.
//!
//! This is the only module that touches `audit_entries` for writing, and it
//! only ever inserts.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally_audit::AuditEntry;
use tally_domain::Snapshot;
use tracing::debug;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::audit_entries;
use crate::error::PersistenceError;
use crate::timestamps::format_timestamp;

backend_fn! {
/// Appends one audit entry and returns its id.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be encoded or the insert fails.
pub fn insert_audit_entry(conn: &mut _, entry: &AuditEntry) -> Result<i64, PersistenceError> {
    let old_data: Option<String> = entry.old_data().map(Snapshot::to_json);
    let new_data: Option<String> = entry.new_data().map(Snapshot::to_json);
    let recorded_at: String = format_timestamp(entry.timestamp())?;

    diesel::insert_into(audit_entries::table)
        .values((
            audit_entries::session_id.eq(entry.session_id()),
            audit_entries::result_id.eq(entry.result_id()),
            audit_entries::action.eq(entry.action().as_str()),
            audit_entries::old_data.eq(old_data),
            audit_entries::new_data.eq(new_data),
            audit_entries::recorded_at.eq(recorded_at),
            audit_entries::user_id.eq(entry.user_id()),
            audit_entries::ip_address.eq(entry.ip_address()),
        ))
        .execute(conn)?;

    let audit_entry_id: i64 = conn.get_last_insert_rowid()?;
    debug!(audit_entry_id, action = %entry.action(), session_id = ?entry.session_id(), "Appended audit entry");

    Ok(audit_entry_id)
}
}
