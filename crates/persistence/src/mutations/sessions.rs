// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally_audit::{NewEntrySession, SessionClosure};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::entry_sessions;
use crate::error::PersistenceError;
use crate::timestamps::format_timestamp;

backend_fn! {
/// Opens an entry session stamped at `now` and returns its id.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_entry_session(
    conn: &mut _,
    params: &NewEntrySession,
    now: OffsetDateTime,
) -> Result<i64, PersistenceError> {
    let started_at: String = format_timestamp(now)?;

    diesel::insert_into(entry_sessions::table)
        .values((
            entry_sessions::event_id.eq(&params.event_id),
            entry_sessions::user_id.eq(&params.user_id),
            entry_sessions::entry_method.eq(params.entry_method.as_str()),
            entry_sessions::format.eq(params.format.as_deref()),
            entry_sessions::file_path.eq(params.file_path.as_deref()),
            entry_sessions::original_filename.eq(params.original_filename.as_deref()),
            entry_sessions::result_count.eq(0_i64),
            entry_sessions::session_start.eq(&started_at),
            entry_sessions::created_at.eq(&started_at),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.get_last_insert_rowid()?;
    info!(session_id, event_id = %params.event_id, entry_method = %params.entry_method, "Opened entry session");

    Ok(session_id)
}
}

backend_fn! {
/// Closes an open session with its final result count.
///
/// Only a session whose end is still unset is touched, so the first
/// closure's count wins. Closing a closed or unknown session is a logged
/// no-op reported through the returned [`SessionClosure`].
///
/// # Errors
///
/// Returns an error if the update or the follow-up lookup fails.
pub fn close_entry_session(
    conn: &mut _,
    session_id: i64,
    result_count: i64,
    now: OffsetDateTime,
) -> Result<SessionClosure, PersistenceError> {
    let ended_at: String = format_timestamp(now)?;

    let updated: usize = diesel::update(
        entry_sessions::table
            .filter(entry_sessions::session_id.eq(session_id))
            .filter(entry_sessions::session_end.is_null()),
    )
    .set((
        entry_sessions::session_end.eq(Some(ended_at)),
        entry_sessions::result_count.eq(result_count),
    ))
    .execute(conn)?;

    if updated > 0 {
        info!(session_id, result_count, "Closed entry session");
        return Ok(SessionClosure::Closed { result_count });
    }

    let kept: Option<i64> = entry_sessions::table
        .filter(entry_sessions::session_id.eq(session_id))
        .select(entry_sessions::result_count)
        .first::<i64>(conn)
        .optional()?;

    if let Some(kept) = kept {
        warn!(session_id, kept, requested = result_count, "Entry session already closed; keeping first count");
        Ok(SessionClosure::AlreadyClosed { result_count: kept })
    } else {
        warn!(session_id, "Entry session not found; nothing to close");
        Ok(SessionClosure::NotFound)
    }
}
}

backend_fn! {
/// Points a session at its artifact file. Returns the number of rows changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_session_file_path(
    conn: &mut _,
    session_id: i64,
    file_path: &str,
) -> Result<usize, PersistenceError> {
    let updated: usize = diesel::update(
        entry_sessions::table.filter(entry_sessions::session_id.eq(session_id)),
    )
    .set(entry_sessions::file_path.eq(Some(file_path)))
    .execute(conn)?;

    info!(session_id, file_path, "Linked artifact to entry session");
    Ok(updated)
}
}

backend_fn! {
/// Records the client's name for a session's file unless one is already
/// stored. Returns the number of rows changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn set_session_original_filename(
    conn: &mut _,
    session_id: i64,
    original_filename: &str,
) -> Result<usize, PersistenceError> {
    let updated: usize = diesel::update(
        entry_sessions::table
            .filter(entry_sessions::session_id.eq(session_id))
            .filter(entry_sessions::original_filename.is_null()),
    )
    .set(entry_sessions::original_filename.eq(Some(original_filename)))
    .execute(conn)?;

    if updated > 0 {
        debug!(session_id, original_filename, "Stored original filename");
    }
    Ok(updated)
}
}
