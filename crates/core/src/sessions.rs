// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::directory::Directory;
use crate::feed::DEFAULT_PAGE_LIMIT;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tally_audit::{AuditEntry, EntrySession};
use tally_domain::{AuditAction, Snapshot};
use time::OffsetDateTime;

const NOT_AVAILABLE: &str = "N/A";

/// One result created inside a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub id: Option<i64>,
    pub competitor_name: String,
    pub competition_class: String,
    pub format: String,
    pub score: Value,
    pub placement: Value,
    pub points_earned: Value,
    pub meca_id: Option<String>,
    pub membership_status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A session with its actor and event resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: EntrySession,
    pub event_title: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub incomplete: bool,
    pub entries: Vec<SessionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionPage {
    pub sessions: Vec<SessionSummary>,
    pub total: usize,
}

/// Summarizes sessions, newest first, with their created results attached.
///
/// `create_logs` may contain entries of other sessions; only those whose
/// session id matches are attached, oldest first.
#[must_use]
pub fn summarize_sessions(
    sessions: &[EntrySession],
    create_logs: &[AuditEntry],
    directory: &Directory,
    as_of: OffsetDateTime,
) -> Vec<SessionSummary> {
    let mut by_session: HashMap<i64, Vec<&AuditEntry>> = HashMap::new();
    for entry in create_logs
        .iter()
        .filter(|e| e.action() == AuditAction::Create)
    {
        if let Some(session_id) = entry.session_id() {
            by_session.entry(session_id).or_default().push(entry);
        }
    }

    let mut summaries: Vec<SessionSummary> = sessions
        .iter()
        .map(|session| {
            let mut creates: Vec<&AuditEntry> =
                by_session.get(&session.id).cloned().unwrap_or_default();
            creates.sort_by_key(|e| (e.timestamp(), e.id()));
            let entries: Vec<SessionEntry> = creates
                .into_iter()
                .map(|entry| session_entry(entry, session, directory))
                .collect();
            summarize(session, entries, directory, as_of)
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.session
            .session_start
            .cmp(&a.session.session_start)
            .then_with(|| b.session.id.cmp(&a.session.id))
    });
    summaries
}

/// Pages sessions after an optional actor/event-title search.
#[must_use]
pub fn page_sessions(
    summaries: Vec<SessionSummary>,
    search: Option<&str>,
    limit: Option<usize>,
    offset: Option<usize>,
) -> SessionPage {
    let needle: Option<String> = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let matching: Vec<SessionSummary> = summaries
        .into_iter()
        .filter(|s| {
            needle.as_deref().is_none_or(|n| {
                s.user_name.to_lowercase().contains(n)
                    || s
                        .user_email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(n))
                    || s.event_title.to_lowercase().contains(n)
            })
        })
        .collect();

    let total: usize = matching.len();
    SessionPage {
        sessions: matching
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT))
            .collect(),
        total,
    }
}

fn summarize(
    session: &EntrySession,
    entries: Vec<SessionEntry>,
    directory: &Directory,
    as_of: OffsetDateTime,
) -> SessionSummary {
    SessionSummary {
        event_title: directory.event_title(&session.event_id),
        user_name: directory.user_name(&session.user_id),
        user_email: directory.user_email(&session.user_id),
        incomplete: session.is_incomplete(as_of),
        session: session.clone(),
        entries,
    }
}

fn session_entry(entry: &AuditEntry, session: &EntrySession, directory: &Directory) -> SessionEntry {
    let data: Snapshot = entry.new_data().cloned().unwrap_or_default();
    let meca_id: Option<String> = data.meca_id();
    let or_na = |value: Option<&Value>| {
        value
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::String(NOT_AVAILABLE.to_string()))
    };

    SessionEntry {
        id: entry.id(),
        competitor_name: data
            .competitor_name()
            .unwrap_or_else(|| String::from("Unknown")),
        competition_class: data
            .competition_class()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        format: data
            .format()
            .or_else(|| session.format.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        score: or_na(data.get("score")),
        placement: or_na(data.get("placement")),
        points_earned: data
            .get("points_earned")
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::from(0)),
        membership_status: directory.membership_status(meca_id.as_deref()),
        meca_id,
        timestamp: entry.timestamp(),
    }
}
