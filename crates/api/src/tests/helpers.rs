// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tally::{EventInfo, ProfileInfo, SeasonInfo};
use tally_audit::EntrySession;
use tally_persistence::Persistence;
use time::macros::{date, datetime};
use time::{Duration, OffsetDateTime};

use crate::{CreateSessionRequest, RecordAuditRequest, create_session};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

pub const BASE_TIME: OffsetDateTime = datetime!(2026-03-07 15:00 UTC);

pub fn at(minutes: i64) -> OffsetDateTime {
    BASE_TIME + Duration::minutes(minutes)
}

/// In-memory store seeded with two events of one season, an admin and a member.
pub fn create_test_persistence() -> Persistence {
    let mut persistence = Persistence::new_in_memory().unwrap();

    persistence
        .upsert_season(&SeasonInfo {
            season_id: String::from("s-2026"),
            name: String::from("2026 Season"),
        })
        .unwrap();
    persistence
        .upsert_event(&EventInfo {
            event_id: String::from("evt-1"),
            title: String::from("Spring Sound Off"),
            event_date: Some(date!(2026 - 03 - 07)),
            season_id: Some(String::from("s-2026")),
        })
        .unwrap();
    persistence
        .upsert_event(&EventInfo {
            event_id: String::from("evt-2"),
            title: String::from("Summer Finals"),
            event_date: Some(date!(2026 - 07 - 18)),
            season_id: Some(String::from("s-2026")),
        })
        .unwrap();
    persistence
        .upsert_profile(&ProfileInfo {
            profile_id: String::from("admin-1"),
            email: Some(String::from("pat@example.com")),
            first_name: Some(String::from("Pat")),
            last_name: Some(String::from("Admin")),
            ..ProfileInfo::default()
        })
        .unwrap();
    persistence
        .upsert_profile(&ProfileInfo {
            profile_id: String::from("member-1"),
            first_name: Some(String::from("Jane")),
            last_name: Some(String::from("Doe")),
            meca_id: Some(String::from("70123")),
            membership_status: Some(String::from("active")),
            ..ProfileInfo::default()
        })
        .unwrap();

    persistence
}

pub fn record_request(
    action: &str,
    session_id: Option<i64>,
    old_data: Option<Value>,
    new_data: Option<Value>,
) -> RecordAuditRequest {
    RecordAuditRequest {
        action: action.to_string(),
        result_id: Some(String::from("r-1")),
        session_id,
        old_data,
        new_data,
        user_id: String::from("admin-1"),
        ip_address: None,
    }
}

pub fn create_session_request(event_id: &str, entry_method: &str) -> CreateSessionRequest {
    CreateSessionRequest {
        event_id: event_id.to_string(),
        user_id: String::from("admin-1"),
        entry_method: entry_method.to_string(),
        format: Some(String::from("SPL")),
        file_path: None,
        original_filename: None,
    }
}

pub fn open_test_session(
    persistence: &mut Persistence,
    event_id: &str,
    entry_method: &str,
    minutes: i64,
) -> EntrySession {
    create_session(persistence, create_session_request(event_id, entry_method), at(minutes)).unwrap()
}

/// A fresh, not yet existing directory under the system temp dir.
pub fn unique_temp_dir(label: &str) -> PathBuf {
    let id: u64 = TEMP_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("tally-api-{label}-{}-{id}", std::process::id()))
}
