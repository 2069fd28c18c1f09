// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally_audit::EntrySession;

use crate::data_models::{EntrySessionRow, decode_session_rows};
use crate::diesel_schema::entry_sessions;
use crate::error::PersistenceError;

backend_fn! {
/// Fetches a single entry session.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn get_entry_session(conn: &mut _, session_id: i64) -> Result<Option<EntrySession>, PersistenceError> {
    let row: Option<EntrySessionRow> = entry_sessions::table
        .filter(entry_sessions::session_id.eq(session_id))
        .select(EntrySessionRow::as_select())
        .first::<EntrySessionRow>(conn)
        .optional()?;

    row.map(EntrySessionRow::into_session).transpose()
}
}

backend_fn! {
/// Lists sessions newest first, optionally restricted to a set of events.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_entry_sessions(conn: &mut _, event_ids: Option<&[String]>) -> Result<Vec<EntrySession>, PersistenceError> {
    let mut query = entry_sessions::table
        .select(EntrySessionRow::as_select())
        .order((entry_sessions::session_start.desc(), entry_sessions::session_id.desc()))
        .into_boxed();

    if let Some(event_ids) = event_ids {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }
        query = query.filter(entry_sessions::event_id.eq_any(event_ids.to_vec()));
    }

    let rows: Vec<EntrySessionRow> = query.load(conn)?;
    Ok(decode_session_rows(rows))
}
}
