// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! - `audit` appends snapshot store rows (never updates or deletes them)
//! - `sessions` opens, closes and links artifacts to entry sessions
//! - `directory` upserts host-owned lookup rows

pub mod audit;
pub mod directory;
pub mod sessions;

pub use audit::{insert_audit_entry_mysql, insert_audit_entry_sqlite};
pub use directory::{
    upsert_event_mysql, upsert_event_sqlite, upsert_profile_mysql, upsert_profile_sqlite,
    upsert_season_mysql, upsert_season_sqlite,
};
pub use sessions::{
    close_entry_session_mysql, close_entry_session_sqlite, insert_entry_session_mysql,
    insert_entry_session_sqlite, set_session_file_path_mysql, set_session_file_path_sqlite,
    set_session_original_filename_mysql, set_session_original_filename_sqlite,
};
