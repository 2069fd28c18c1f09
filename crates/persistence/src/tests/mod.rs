// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod audit_store_tests;

use serde_json::json;
use tally_audit::{AuditEntry, NewAuditEntry, NewEntrySession};
use tally_domain::{AuditAction, EntryMethod, Snapshot};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::Persistence;

pub const BASE_TIME: OffsetDateTime = datetime!(2026-03-07 15:00 UTC);

pub fn at(minutes: i64) -> OffsetDateTime {
    BASE_TIME + Duration::minutes(minutes)
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn create_test_snapshot(result_id: &str, name: &str, score: f64) -> Snapshot {
    Snapshot::from_value(json!({
        "id": result_id,
        "event_id": "evt-1",
        "competitor_name": name,
        "competition_class": "Street 1",
        "score": score,
    }))
    .unwrap()
}

pub fn create_test_entry(
    action: AuditAction,
    session_id: Option<i64>,
    result_id: &str,
    minutes: i64,
) -> AuditEntry {
    let record = NewAuditEntry {
        action,
        result_id: Some(result_id.to_string()),
        session_id,
        old_data: action
            .requires_old_data()
            .then(|| create_test_snapshot(result_id, "Jane Doe", 120.0)),
        new_data: action
            .requires_new_data()
            .then(|| create_test_snapshot(result_id, "Jane Doe", 122.5)),
        user_id: String::from("admin-1"),
        ip_address: Some(String::from("10.0.0.7")),
    };
    AuditEntry::new(record, at(minutes)).unwrap()
}

pub fn create_test_session_params(event_id: &str, entry_method: EntryMethod) -> NewEntrySession {
    NewEntrySession {
        event_id: event_id.to_string(),
        user_id: String::from("admin-1"),
        entry_method,
        format: Some(String::from("SPL")),
        file_path: None,
        original_filename: None,
    }
}
