// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::directory::Directory;
use crate::sessions::SessionSummary;
use serde::Serialize;
use tally_audit::AuditEntry;
use tally_domain::{AuditAction, Snapshot};

/// An audit entry with its actor resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub user_email: Option<String>,
    pub user_first_name: Option<String>,
    pub user_last_name: Option<String>,
}

impl AuditLogView {
    #[must_use]
    pub fn new(entry: AuditEntry, directory: &Directory) -> Self {
        let profile = directory.profile(entry.user_id());
        Self {
            user_email: profile.and_then(|p| p.email.clone()),
            user_first_name: profile.and_then(|p| p.first_name.clone()),
            user_last_name: profile.and_then(|p| p.last_name.clone()),
            entry,
        }
    }
}

/// Imports, modifications and deletions of one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventLogs {
    pub imports: Vec<SessionSummary>,
    pub modifications: Vec<AuditLogView>,
    pub deletions: Vec<AuditLogView>,
}

/// Whether a change entry belongs to the event's history.
///
/// Updates match on either snapshot; deletions only on the before-snapshot.
#[must_use]
pub fn touches_event(entry: &AuditEntry, event_id: &str) -> bool {
    let matches = |snapshot: Option<&Snapshot>| {
        snapshot
            .and_then(Snapshot::event_id)
            .is_some_and(|id| id == event_id)
    };

    match entry.action() {
        AuditAction::Create => matches(entry.new_data()),
        AuditAction::Update => matches(entry.old_data()) || matches(entry.new_data()),
        AuditAction::Delete => matches(entry.old_data()),
    }
}

/// Entries of one action touching an event, newest first, with actors resolved.
#[must_use]
pub fn event_log_views(
    entries: Vec<AuditEntry>,
    action: AuditAction,
    event_id: &str,
    directory: &Directory,
) -> Vec<AuditLogView> {
    let mut matching: Vec<AuditEntry> = entries
        .into_iter()
        .filter(|e| e.action() == action && touches_event(e, event_id))
        .collect();
    matching.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| b.id().cmp(&a.id()))
    });
    matching
        .into_iter()
        .map(|entry| AuditLogView::new(entry, directory))
        .collect()
}
