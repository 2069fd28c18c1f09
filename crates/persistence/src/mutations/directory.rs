// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Upserts for host-owned directory rows.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tally::{EventInfo, ProfileInfo, SeasonInfo};
use tracing::debug;

use crate::diesel_schema::{events, profiles, seasons};
use crate::error::PersistenceError;
use crate::timestamps::format_date;

backend_fn! {
/// Inserts or replaces an event row.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn upsert_event(conn: &mut _, event: &EventInfo) -> Result<(), PersistenceError> {
    let event_date: Option<String> = event.event_date.map(format_date).transpose()?;

    diesel::replace_into(events::table)
        .values((
            events::event_id.eq(&event.event_id),
            events::title.eq(&event.title),
            events::event_date.eq(event_date),
            events::season_id.eq(event.season_id.as_deref()),
        ))
        .execute(conn)?;

    debug!(event_id = %event.event_id, "Upserted event");
    Ok(())
}
}

backend_fn! {
/// Inserts or replaces a season row.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn upsert_season(conn: &mut _, season: &SeasonInfo) -> Result<(), PersistenceError> {
    diesel::replace_into(seasons::table)
        .values((
            seasons::season_id.eq(&season.season_id),
            seasons::name.eq(&season.name),
        ))
        .execute(conn)?;
    Ok(())
}
}

backend_fn! {
/// Inserts or replaces a profile row.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub fn upsert_profile(conn: &mut _, profile: &ProfileInfo) -> Result<(), PersistenceError> {
    diesel::replace_into(profiles::table)
        .values((
            profiles::profile_id.eq(&profile.profile_id),
            profiles::email.eq(profile.email.as_deref()),
            profiles::first_name.eq(profile.first_name.as_deref()),
            profiles::last_name.eq(profile.last_name.as_deref()),
            profiles::meca_id.eq(profile.meca_id.as_deref()),
            profiles::membership_status.eq(profile.membership_status.as_deref()),
        ))
        .execute(conn)?;
    Ok(())
}
}
