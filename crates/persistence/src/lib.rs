// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Tally results audit trail.
//!
//! This crate stores audit entries (the snapshot store), entry sessions,
//! and the host-owned directory tables used to resolve event, season and
//! user names. It is built on Diesel and supports multiple backends.
//!
//! ## Database Backend Support
//!
//! - **`SQLite`** (default) is used for development and for every test
//! - **`MariaDB`/`MySQL`** is compiled in and validated by opt-in tests
//!
//! To run `MySQL` validation tests:
//! ```bash
//! cargo xtask test-mariadb
//! ```
//!
//! ### Migration Strategy
//!
//! Each backend has its own migration directory with identical schema
//! semantics:
//!
//! - `migrations/` for `SQLite`
//! - `migrations_mysql/` for `MySQL`/`MariaDB`
//!
//! ## Append-only store
//!
//! Audit entries are only ever inserted. Nothing in this crate updates or
//! deletes an `audit_entries` row.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::{MysqlConnection, SqliteConnection};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tally::{Directory, EventInfo, ProfileInfo, SeasonInfo};
use tally_audit::{AuditEntry, EntrySession, NewEntrySession, SessionClosure};
use tally_domain::AuditAction;
use time::OffsetDateTime;
use tracing::error;

/// Atomic counter for generating unique in-memory database names.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates monomorphic `_sqlite` and `_mysql` variants of one function body.
///
/// Diesel needs a concrete backend type at compile time, so each query or
/// mutation is written once against `conn: &mut _` and expanded twice.
/// Dispatch between the two happens only in [`Persistence`].
///
/// ```ignore
/// backend_fn! {
///     pub fn count_rows(conn: &mut _, id: i64) -> Result<i64, PersistenceError> {
///         // body shared by both backends
///     }
/// }
/// ```
macro_rules! backend_fn {
    (
        $(#[$meta:meta])*
        $vis:vis fn $name:ident (
            $conn:ident : &mut _
            $(, $param:ident : $param_ty:ty)* $(,)?
        ) -> $ret:ty
        $body:block
    ) => {
        pastey::paste! {
            $(#[$meta])*
            $vis fn [<$name _sqlite>] (
                $conn: &mut SqliteConnection
                $(, $param : $param_ty)*
            ) -> $ret
            $body

            $(#[$meta])*
            $vis fn [<$name _mysql>] (
                $conn: &mut MysqlConnection
                $(, $param : $param_ty)*
            ) -> $ret
            $body
        }
    };
}

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;
pub mod timestamps;

#[cfg(test)]
mod tests;

pub use error::PersistenceError;

/// Backend-specific database connection.
pub enum BackendConnection {
    Sqlite(SqliteConnection),
    Mysql(MysqlConnection),
}

/// Backend-agnostic persistence adapter.
///
/// The backend is chosen once at construction time.
pub struct Persistence {
    pub(crate) conn: BackendConnection,
}

impl Persistence {
    /// Creates an adapter over a fresh, isolated in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;

        Ok(Self {
            conn: BackendConnection::Sqlite(conn),
        })
    }

    /// Creates an adapter over a file-based `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;

        Ok(Self {
            conn: BackendConnection::Sqlite(conn),
        })
    }

    /// Creates an adapter over a `MySQL`/`MariaDB` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_mysql(database_url: &str) -> Result<Self, PersistenceError> {
        let conn: MysqlConnection = backend::mysql::initialize_database(database_url)?;

        Ok(Self {
            conn: BackendConnection::Mysql(conn),
        })
    }

    /// Runs `f` inside a database transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and rolls back otherwise,
    /// so an audit row written by `f` shares the fate of the caller's change.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `f`, or a [`PersistenceError`] if the
    /// transaction cannot be started or committed.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<PersistenceError>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit_transaction()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback_transaction() {
                    error!(error = %rollback_err, "Failed to roll back transaction");
                }
                Err(err)
            }
        }
    }

    fn begin_transaction(&mut self) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                <AnsiTransactionManager as TransactionManager<SqliteConnection>>::begin_transaction(conn)
            }
            BackendConnection::Mysql(conn) => {
                <AnsiTransactionManager as TransactionManager<MysqlConnection>>::begin_transaction(conn)
            }
        }
        .map_err(Into::into)
    }

    fn commit_transaction(&mut self) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                <AnsiTransactionManager as TransactionManager<SqliteConnection>>::commit_transaction(conn)
            }
            BackendConnection::Mysql(conn) => {
                <AnsiTransactionManager as TransactionManager<MysqlConnection>>::commit_transaction(conn)
            }
        }
        .map_err(Into::into)
    }

    fn rollback_transaction(&mut self) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                <AnsiTransactionManager as TransactionManager<SqliteConnection>>::rollback_transaction(conn)
            }
            BackendConnection::Mysql(conn) => {
                <AnsiTransactionManager as TransactionManager<MysqlConnection>>::rollback_transaction(conn)
            }
        }
        .map_err(Into::into)
    }

    // ========================================================================
    // Snapshot store
    // ========================================================================

    /// Appends an audit entry and returns its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_audit_entry(&mut self, entry: &AuditEntry) -> Result<i64, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::insert_audit_entry_sqlite(conn, entry),
            BackendConnection::Mysql(conn) => mutations::insert_audit_entry_mysql(conn, entry),
        }
    }

    /// Fetches one audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_audit_entry(&mut self, audit_entry_id: i64) -> Result<Option<AuditEntry>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::get_audit_entry_sqlite(conn, audit_entry_id),
            BackendConnection::Mysql(conn) => queries::get_audit_entry_mysql(conn, audit_entry_id),
        }
    }

    /// Lists a session's audit entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_session_entries(&mut self, session_id: i64) -> Result<Vec<AuditEntry>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::list_session_entries_sqlite(conn, session_id),
            BackendConnection::Mysql(conn) => queries::list_session_entries_mysql(conn, session_id),
        }
    }

    /// Lists `create` entries for the given sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_create_entries(&mut self, session_ids: &[i64]) -> Result<Vec<AuditEntry>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::list_create_entries_sqlite(conn, session_ids),
            BackendConnection::Mysql(conn) => queries::list_create_entries_mysql(conn, session_ids),
        }
    }

    /// Lists every `update` and `delete` entry, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_change_entries(&mut self) -> Result<Vec<AuditEntry>, PersistenceError> {
        self.list_entries_by_actions(&[AuditAction::Update, AuditAction::Delete])
    }

    /// Lists every entry with the given action, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_entries_by_action(&mut self, action: AuditAction) -> Result<Vec<AuditEntry>, PersistenceError> {
        self.list_entries_by_actions(&[action])
    }

    fn list_entries_by_actions(&mut self, actions: &[AuditAction]) -> Result<Vec<AuditEntry>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::list_entries_by_actions_sqlite(conn, actions),
            BackendConnection::Mysql(conn) => queries::list_entries_by_actions_mysql(conn, actions),
        }
    }

    // ========================================================================
    // Entry sessions
    // ========================================================================

    /// Opens an entry session at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn create_entry_session(
        &mut self,
        params: &NewEntrySession,
        now: OffsetDateTime,
    ) -> Result<EntrySession, PersistenceError> {
        let session_id: i64 = match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::insert_entry_session_sqlite(conn, params, now),
            BackendConnection::Mysql(conn) => mutations::insert_entry_session_mysql(conn, params, now),
        }?;

        Ok(EntrySession::open(session_id, params.clone(), now))
    }

    /// Fetches one entry session.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is malformed.
    pub fn get_entry_session(&mut self, session_id: i64) -> Result<Option<EntrySession>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::get_entry_session_sqlite(conn, session_id),
            BackendConnection::Mysql(conn) => queries::get_entry_session_mysql(conn, session_id),
        }
    }

    /// Closes a session with its final count; the first closure wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn close_entry_session(
        &mut self,
        session_id: i64,
        result_count: i64,
        now: OffsetDateTime,
    ) -> Result<SessionClosure, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                mutations::close_entry_session_sqlite(conn, session_id, result_count, now)
            }
            BackendConnection::Mysql(conn) => {
                mutations::close_entry_session_mysql(conn, session_id, result_count, now)
            }
        }
    }

    /// Links an artifact path to a session.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::SessionNotFound`] if no row was changed.
    pub fn set_session_file_path(&mut self, session_id: i64, file_path: &str) -> Result<(), PersistenceError> {
        let updated: usize = match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                mutations::set_session_file_path_sqlite(conn, session_id, file_path)
            }
            BackendConnection::Mysql(conn) => {
                mutations::set_session_file_path_mysql(conn, session_id, file_path)
            }
        }?;

        if updated == 0 {
            return Err(PersistenceError::SessionNotFound(session_id));
        }
        Ok(())
    }

    /// Stores the name the client gave a session's file, keeping any name
    /// set when the session was opened.
    ///
    /// Returns `true` if the name was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn set_session_original_filename(
        &mut self,
        session_id: i64,
        original_filename: &str,
    ) -> Result<bool, PersistenceError> {
        let updated: usize = match &mut self.conn {
            BackendConnection::Sqlite(conn) => {
                mutations::set_session_original_filename_sqlite(conn, session_id, original_filename)
            }
            BackendConnection::Mysql(conn) => {
                mutations::set_session_original_filename_mysql(conn, session_id, original_filename)
            }
        }?;
        Ok(updated > 0)
    }

    /// Lists sessions newest first, optionally limited to the given events.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_entry_sessions(
        &mut self,
        event_ids: Option<&[String]>,
    ) -> Result<Vec<EntrySession>, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::list_entry_sessions_sqlite(conn, event_ids),
            BackendConnection::Mysql(conn) => queries::list_entry_sessions_mysql(conn, event_ids),
        }
    }

    // ========================================================================
    // Directory
    // ========================================================================

    /// Loads the event, season and profile lookups.
    ///
    /// # Errors
    ///
    /// Returns an error if any lookup query fails.
    pub fn load_directory(&mut self) -> Result<Directory, PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => queries::load_directory_sqlite(conn),
            BackendConnection::Mysql(conn) => queries::load_directory_mysql(conn),
        }
    }

    /// Inserts or replaces an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn upsert_event(&mut self, event: &EventInfo) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::upsert_event_sqlite(conn, event),
            BackendConnection::Mysql(conn) => mutations::upsert_event_mysql(conn, event),
        }
    }

    /// Inserts or replaces a season.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn upsert_season(&mut self, season: &SeasonInfo) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::upsert_season_sqlite(conn, season),
            BackendConnection::Mysql(conn) => mutations::upsert_season_mysql(conn, season),
        }
    }

    /// Inserts or replaces a profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub fn upsert_profile(&mut self, profile: &ProfileInfo) -> Result<(), PersistenceError> {
        match &mut self.conn {
            BackendConnection::Sqlite(conn) => mutations::upsert_profile_sqlite(conn, profile),
            BackendConnection::Mysql(conn) => mutations::upsert_profile_mysql(conn, profile),
        }
    }
}
