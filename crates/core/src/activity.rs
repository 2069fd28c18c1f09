// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reconstruction of the activity feed from sessions and audit entries.
//!
//! Activities are never stored. They are rebuilt on every read from three
//! inputs: entry sessions, the `create` entries recorded inside them, and
//! the `update`/`delete` entries. Change entries that share a session and
//! an action collapse into one activity.

use crate::diff::{FieldChange, diff_snapshots};
use crate::directory::Directory;
use crate::error::CoreError;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use tally_audit::{AuditEntry, EntrySession};
use tally_domain::{AuditAction, EntryMethod, Snapshot};
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const ISO_DATE: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const DISPLAY_DATE: &[BorrowedFormatItem<'_>] =
    format_description!("[month repr:short] [day padding:none], [year]");

/// Renders a date the way the feed displays it, e.g. `Mar 7, 2026`.
#[must_use]
pub fn display_date(date: Date) -> String {
    date.format(DISPLAY_DATE).unwrap_or_default()
}

/// The three kinds of activity in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    NewEntry,
    Modification,
    Deletion,
}

impl ActivityType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewEntry => "new_entry",
            Self::Modification => "modification",
            Self::Deletion => "deletion",
        }
    }

    /// The activity type a change entry contributes to, if any.
    #[must_use]
    pub const fn from_action(action: AuditAction) -> Option<Self> {
        match action {
            AuditAction::Create => None,
            AuditAction::Update => Some(Self::Modification),
            AuditAction::Delete => Some(Self::Deletion),
        }
    }
}

impl FromStr for ActivityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new_entry" => Ok(Self::NewEntry),
            "modification" => Ok(Self::Modification),
            "deletion" => Ok(Self::Deletion),
            _ => Err(CoreError::InvalidActivityType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an activity was reconstructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Session,
    AuditLog,
}

/// One affected result within an activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorDetail {
    pub id: Option<i64>,
    pub competitor_name: String,
    pub meca_id: Option<String>,
    pub competition_class: Option<String>,
    pub format: Option<String>,
    pub score: Option<Value>,
    pub membership_status: String,
    pub old_data: Option<Snapshot>,
    pub new_data: Option<Snapshot>,
    pub changes: Vec<FieldChange>,
}

impl CompetitorDetail {
    fn from_entry(entry: &AuditEntry, directory: &Directory) -> Self {
        let subject: Option<&Snapshot> = entry.subject();
        let meca_id: Option<String> = subject.and_then(Snapshot::meca_id);
        let changes: Vec<FieldChange> = match (entry.old_data(), entry.new_data()) {
            (Some(old), Some(new)) => diff_snapshots(Some(old), Some(new)),
            _ => Vec::new(),
        };

        Self {
            id: entry.id(),
            competitor_name: subject
                .and_then(Snapshot::competitor_name)
                .unwrap_or_else(|| String::from("Unknown")),
            membership_status: directory.membership_status(meca_id.as_deref()),
            meca_id,
            competition_class: subject.and_then(Snapshot::competition_class),
            format: subject.and_then(Snapshot::format),
            score: subject
                .and_then(|s| s.get(tally_domain::snapshot::SCORE))
                .filter(|v| !v.is_null())
                .cloned(),
            old_data: entry.old_data().cloned(),
            new_data: entry.new_data().cloned(),
            changes,
        }
    }
}

/// A raw entry folded into a grouped activity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedLog {
    pub id: Option<i64>,
    pub action: AuditAction,
    pub old_data: Option<Snapshot>,
    pub new_data: Option<Snapshot>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<&AuditEntry> for GroupedLog {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            id: entry.id(),
            action: entry.action(),
            old_data: entry.old_data().cloned(),
            new_data: entry.new_data().cloned(),
            timestamp: entry.timestamp(),
        }
    }
}

/// One line of the activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub source_type: SourceType,
    pub action_type: ActivityType,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub event_id: Option<String>,
    pub event_title: Option<String>,
    #[serde(serialize_with = "serialize_iso_date")]
    pub event_date: Option<Date>,
    pub season_id: Option<String>,
    pub season_name: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub entry_method: EntryMethod,
    pub format: Option<String>,
    pub result_count: i64,
    pub file_path: Option<String>,
    pub original_filename: Option<String>,
    pub session_id: Option<i64>,
    pub competitor_names: Vec<String>,
    pub competitor_details: Vec<CompetitorDetail>,
    pub competition_class: Option<String>,
    pub old_data: Option<Snapshot>,
    pub new_data: Option<Snapshot>,
    pub grouped_logs: Option<Vec<GroupedLog>>,
    pub changes: Vec<FieldChange>,
    pub subject: String,
    pub incomplete: bool,
}

impl Activity {
    fn attach_event(&mut self, directory: &Directory) {
        let Some(event_id) = self.event_id.as_deref() else {
            return;
        };
        self.event_title = Some(directory.event_title(event_id));
        if let Some(event) = directory.event(event_id) {
            self.event_date = event.event_date;
            self.season_id.clone_from(&event.season_id);
            self.season_name = event
                .season_id
                .as_deref()
                .and_then(|season_id| directory.season_name(season_id))
                .map(str::to_string);
        }
    }
}

#[allow(clippy::ref_option)]
fn serialize_iso_date<S: Serializer>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error> {
    match date.and_then(|d| d.format(ISO_DATE).ok()) {
        Some(text) => serializer.serialize_some(&text),
        None => serializer.serialize_none(),
    }
}

/// Everything the reconstructor reads.
#[derive(Debug, Clone, Copy)]
pub struct ActivityInputs<'a> {
    /// Entry sessions in scope.
    pub sessions: &'a [EntrySession],
    /// `create` entries, used for competitor names of new-entry activities.
    pub create_logs: &'a [AuditEntry],
    /// `update` and `delete` entries.
    pub change_logs: &'a [AuditEntry],
    pub directory: &'a Directory,
    /// Instant the feed is observed at, for the incomplete-session flag.
    pub as_of: OffsetDateTime,
}

/// Builds one activity per session and per change group, unsorted.
#[must_use]
pub fn build_activities(inputs: &ActivityInputs<'_>) -> Vec<Activity> {
    let mut creates_by_session: HashMap<i64, Vec<&AuditEntry>> = HashMap::new();
    for entry in inputs
        .create_logs
        .iter()
        .filter(|e| e.action() == AuditAction::Create)
    {
        if let Some(session_id) = entry.session_id() {
            creates_by_session.entry(session_id).or_default().push(entry);
        }
    }
    for rows in creates_by_session.values_mut() {
        rows.sort_by_key(|e| (e.timestamp(), e.id()));
    }

    let sessions_by_id: HashMap<i64, &EntrySession> =
        inputs.sessions.iter().map(|s| (s.id, s)).collect();

    let mut activities: Vec<Activity> = inputs
        .sessions
        .iter()
        .map(|session| {
            let creates: &[&AuditEntry] = creates_by_session
                .get(&session.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            session_activity(session, creates, inputs.directory, inputs.as_of)
        })
        .collect();

    let mut grouped: HashMap<(i64, AuditAction), Vec<&AuditEntry>> = HashMap::new();
    let mut ungrouped: Vec<Vec<&AuditEntry>> = Vec::new();
    for entry in inputs
        .change_logs
        .iter()
        .filter(|e| e.action() != AuditAction::Create)
    {
        match entry.session_id() {
            Some(session_id) => grouped
                .entry((session_id, entry.action()))
                .or_default()
                .push(entry),
            None => ungrouped.push(vec![entry]),
        }
    }

    for ((session_id, _), rows) in grouped {
        let session: Option<&EntrySession> = sessions_by_id.get(&session_id).copied();
        activities.extend(change_activity(rows, session, inputs.directory));
    }
    for rows in ungrouped {
        activities.extend(change_activity(rows, None, inputs.directory));
    }

    activities
}

fn session_activity(
    session: &EntrySession,
    creates: &[&AuditEntry],
    directory: &Directory,
    as_of: OffsetDateTime,
) -> Activity {
    let competitor_details: Vec<CompetitorDetail> = creates
        .iter()
        .map(|entry| CompetitorDetail::from_entry(entry, directory))
        .collect();
    let competitor_names: Vec<String> = unique_names(creates);

    let mut activity: Activity = Activity {
        id: session.id,
        source_type: SourceType::Session,
        action_type: ActivityType::NewEntry,
        date: session.session_start,
        event_id: Some(session.event_id.clone()),
        event_title: None,
        event_date: None,
        season_id: None,
        season_name: None,
        user_id: session.user_id.clone(),
        user_name: directory.user_name(&session.user_id),
        user_email: directory.user_email(&session.user_id),
        entry_method: session.entry_method,
        format: session.format.clone(),
        result_count: session.result_count,
        file_path: session.file_path.clone(),
        original_filename: session.original_filename.clone(),
        session_id: Some(session.id),
        subject: subject_line(&competitor_names, session.result_count),
        competitor_names,
        competitor_details,
        competition_class: None,
        old_data: None,
        new_data: None,
        grouped_logs: None,
        changes: Vec::new(),
        incomplete: session.is_incomplete(as_of),
    };
    activity.attach_event(directory);
    activity
}

fn change_activity(
    mut rows: Vec<&AuditEntry>,
    session: Option<&EntrySession>,
    directory: &Directory,
) -> Option<Activity> {
    rows.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| b.id().cmp(&a.id()))
    });
    let newest: &AuditEntry = rows.first().copied()?;
    let action_type: ActivityType = ActivityType::from_action(newest.action())?;
    let subject: Option<&Snapshot> = newest.subject();

    let competitor_details: Vec<CompetitorDetail> = rows
        .iter()
        .map(|entry| CompetitorDetail::from_entry(entry, directory))
        .collect();
    let competitor_names: Vec<String> = unique_names(&rows);
    let result_count: i64 = i64::try_from(rows.len()).unwrap_or(i64::MAX);
    let changes: Vec<FieldChange> = if rows.len() == 1 {
        competitor_details
            .first()
            .map(|d| d.changes.clone())
            .unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut activity: Activity = Activity {
        id: newest.id().unwrap_or_default(),
        source_type: SourceType::AuditLog,
        action_type,
        date: newest.timestamp(),
        event_id: rows.iter().find_map(|e| e.event_id()),
        event_title: None,
        event_date: None,
        season_id: None,
        season_name: None,
        user_id: newest.user_id().to_string(),
        user_name: directory.user_name(newest.user_id()),
        user_email: directory.user_email(newest.user_id()),
        entry_method: session.map_or(EntryMethod::Manual, |s| s.entry_method),
        format: subject.and_then(Snapshot::format),
        result_count,
        file_path: None,
        original_filename: None,
        session_id: newest.session_id(),
        subject: subject_line(&competitor_names, result_count),
        competitor_names,
        competitor_details,
        competition_class: subject.and_then(Snapshot::competition_class),
        old_data: newest.old_data().cloned(),
        new_data: newest.new_data().cloned(),
        grouped_logs: (rows.len() > 1).then(|| rows.iter().map(|e| GroupedLog::from(*e)).collect()),
        changes,
        incomplete: false,
    };
    activity.attach_event(directory);
    Some(activity)
}

fn unique_names(entries: &[&AuditEntry]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in entries
        .iter()
        .filter_map(|e| e.subject().and_then(Snapshot::competitor_name))
    {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn subject_line(names: &[String], count: i64) -> String {
    if !names.is_empty() {
        return names.join(", ");
    }
    if count == 1 {
        String::from("1 result")
    } else {
        format!("{count} results")
    }
}
