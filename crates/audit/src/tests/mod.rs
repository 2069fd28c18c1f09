// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]


use serde_json::json;
use tally_domain::{AuditAction, Snapshot};

pub fn create_test_snapshot(name: &str, score: f64) -> Snapshot {
    Snapshot::from_value(json!({
        "id": "r-1",
        "event_id": "evt-1",
        "competitor_name": name,
        "score": score,
    }))
    .unwrap()
}

pub fn create_test_record(action: AuditAction) -> crate::NewAuditEntry {
    crate::NewAuditEntry {
        action,
        result_id: Some(String::from("r-1")),
        session_id: None,
        old_data: action
            .requires_old_data()
            .then(|| create_test_snapshot("Jane Doe", 120.0)),
        new_data: action
            .requires_new_data()
            .then(|| create_test_snapshot("Jane Doe", 122.5)),
        user_id: String::from("user-1"),
        ip_address: None,
    }
}
