// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{Directory, EventInfo, ProfileInfo, SeasonInfo};
use serde_json::Value;
use tally_audit::{AuditEntry, EntrySession, NewAuditEntry, NewEntrySession};
use tally_domain::{AuditAction, EntryMethod, Snapshot};
use time::macros::{date, datetime};
use time::{Duration, OffsetDateTime};

pub const BASE_TIME: OffsetDateTime = datetime!(2026-03-07 15:00 UTC);

pub fn snap(value: Value) -> Snapshot {
    Snapshot::from_value(value).unwrap()
}

pub fn at(minutes: i64) -> OffsetDateTime {
    BASE_TIME + Duration::minutes(minutes)
}

pub fn create_test_directory() -> Directory {
    Directory::new(
        vec![
            EventInfo {
                event_id: String::from("evt-1"),
                title: String::from("Spring Sound Off"),
                event_date: Some(date!(2026 - 03 - 07)),
                season_id: Some(String::from("s-2026")),
            },
            EventInfo {
                event_id: String::from("evt-2"),
                title: String::from("Summer Finals"),
                event_date: Some(date!(2026 - 07 - 18)),
                season_id: Some(String::from("s-2026")),
            },
        ],
        vec![SeasonInfo {
            season_id: String::from("s-2026"),
            name: String::from("2026 Season"),
        }],
        vec![
            ProfileInfo {
                profile_id: String::from("admin-1"),
                email: Some(String::from("pat@example.com")),
                first_name: Some(String::from("Pat")),
                last_name: Some(String::from("Admin")),
                meca_id: None,
                membership_status: None,
            },
            ProfileInfo {
                profile_id: String::from("member-1"),
                email: Some(String::from("jane@example.com")),
                first_name: Some(String::from("Jane")),
                last_name: Some(String::from("Doe")),
                meca_id: Some(String::from("70123")),
                membership_status: Some(String::from("active")),
            },
        ],
    )
}

pub fn create_test_session(id: i64, event_id: &str, method: EntryMethod, minutes: i64) -> EntrySession {
    EntrySession::open(
        id,
        NewEntrySession {
            event_id: event_id.to_string(),
            user_id: String::from("admin-1"),
            entry_method: method,
            format: Some(String::from("SPL")),
            file_path: None,
            original_filename: None,
        },
        at(minutes),
    )
}

pub fn create_test_entry(
    id: i64,
    action: AuditAction,
    session_id: Option<i64>,
    old_data: Option<Value>,
    new_data: Option<Value>,
    minutes: i64,
) -> AuditEntry {
    AuditEntry::restore(
        id,
        NewAuditEntry {
            action,
            result_id: Some(format!("r-{id}")),
            session_id,
            old_data: old_data.map(snap),
            new_data: new_data.map(snap),
            user_id: String::from("admin-1"),
            ip_address: None,
        },
        at(minutes),
    )
}
