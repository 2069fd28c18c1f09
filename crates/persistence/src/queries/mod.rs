// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic read modules.
//!
//! Rows that fail to decode are skipped with a warning rather than failing
//! the whole read.

pub mod audit;
pub mod directory;
pub mod sessions;

pub use audit::{
    get_audit_entry_mysql, get_audit_entry_sqlite, list_create_entries_mysql,
    list_create_entries_sqlite, list_entries_by_actions_mysql, list_entries_by_actions_sqlite,
    list_session_entries_mysql, list_session_entries_sqlite,
};
pub use directory::{load_directory_mysql, load_directory_sqlite};
pub use sessions::{
    get_entry_session_mysql, get_entry_session_sqlite, list_entry_sessions_mysql,
    list_entry_sessions_sqlite,
};
