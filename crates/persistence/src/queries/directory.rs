// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally::{Directory, EventInfo, ProfileInfo, SeasonInfo};

use crate::data_models::{EventRow, ProfileRow, SeasonRow};
use crate::diesel_schema::{events, profiles, seasons};
use crate::error::PersistenceError;

backend_fn! {
/// Loads every event, season and profile into a [`Directory`].
///
/// # Errors
///
/// Returns an error if any of the three queries fails.
pub fn load_directory(conn: &mut _) -> Result<Directory, PersistenceError> {
    let event_rows: Vec<EventRow> = events::table.select(EventRow::as_select()).load(conn)?;
    let season_rows: Vec<SeasonRow> = seasons::table.select(SeasonRow::as_select()).load(conn)?;
    let profile_rows: Vec<ProfileRow> = profiles::table.select(ProfileRow::as_select()).load(conn)?;

    Ok(Directory::new(
        event_rows.into_iter().map(EventInfo::from).collect(),
        season_rows.into_iter().map(SeasonInfo::from).collect(),
        profile_rows.into_iter().map(ProfileInfo::from).collect(),
    ))
}
}
