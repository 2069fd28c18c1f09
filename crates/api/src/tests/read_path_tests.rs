// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde_json::json;
use tally::ActivityType;
use tally_persistence::Persistence;

use super::helpers::{at, create_test_persistence, open_test_session, record_request};
use crate::{
    ActivityQuery, ApiError, EndSessionRequest, SessionListQuery, end_session,
    get_audit_log_by_id, get_event_all_logs, get_event_deletions, get_event_modifications,
    get_session_audit_logs, list_activity, list_all_sessions, record,
};

fn record_update(persistence: &mut Persistence, session_id: Option<i64>, name: &str, minutes: i64) {
    let request = record_request(
        "update",
        session_id,
        Some(json!({"event_id": "evt-1", "competitor_name": name, "score": 100})),
        Some(json!({"event_id": "evt-1", "competitor_name": name, "score": 101})),
    );
    record(persistence, request, at(minutes)).unwrap();
}

#[test]
fn test_score_change_is_listed_with_single_diff() {
    let mut persistence = create_test_persistence();
    let request = record_request(
        "update",
        None,
        Some(json!({"event_id": "evt-1", "competitor_name": "Jane Doe", "score": 120.0})),
        Some(json!({"eventId": "evt-1", "competitorName": "Jane Doe", "score": 122.5})),
    );
    record(&mut persistence, request, at(0)).unwrap();

    let page = list_activity(&mut persistence, &ActivityQuery::default(), at(5)).unwrap();

    assert_eq!(page.total, 1);
    let activity = &page.activities[0];
    assert_eq!(activity.action_type, ActivityType::Modification);
    assert_eq!(activity.event_title.as_deref(), Some("Spring Sound Off"));
    assert_eq!(activity.user_name, "Pat Admin");
    assert_eq!(activity.changes.len(), 1);
    assert_eq!(activity.changes[0].label, "Score");
    assert_eq!(activity.changes[0].old_value, json!(120.0));
    assert_eq!(activity.changes[0].new_value, json!(122.5));
}

#[test]
fn test_session_updates_collapse_into_one_activity() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    record_update(&mut persistence, Some(session.id), "A One", 1);
    record_update(&mut persistence, Some(session.id), "B Two", 2);
    record_update(&mut persistence, Some(session.id), "C Three", 3);

    let query = ActivityQuery {
        action_type: Some(String::from("modification")),
        ..ActivityQuery::default()
    };
    let page = list_activity(&mut persistence, &query, at(5)).unwrap();

    assert_eq!(page.total, 1);
    let grouped = page.activities[0].grouped_logs.as_ref().unwrap();
    assert_eq!(grouped.len(), 3);
    assert_eq!(page.activities[0].date, at(3));
}

#[test]
fn test_stats_cover_every_type() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    end_session(&mut persistence, session.id, EndSessionRequest { result_count: 3 }, at(1)).unwrap();
    record_update(&mut persistence, None, "Jane Doe", 2);
    let delete = record_request("delete", None, Some(json!({"event_id": "evt-2", "competitor_name": "Sam Roe"})), None);
    record(&mut persistence, delete, at(3)).unwrap();

    let query = ActivityQuery {
        action_type: Some(String::from("all")),
        limit: Some(1),
        ..ActivityQuery::default()
    };
    let page = list_activity(&mut persistence, &query, at(5)).unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(page.activities.len(), 1);
    assert_eq!(page.stats.new_entries, 1);
    assert_eq!(page.stats.modifications, 1);
    assert_eq!(page.stats.deletions, 1);
    assert_eq!(page.activities[0].action_type, ActivityType::Deletion);
}

#[test]
fn test_unknown_action_type_is_invalid() {
    let mut persistence = create_test_persistence();
    let query = ActivityQuery {
        action_type: Some(String::from("rename")),
        ..ActivityQuery::default()
    };

    let result = list_activity(&mut persistence, &query, at(0));
    assert!(matches!(result, Err(ApiError::InvalidInput { field, .. }) if field == "actionType"));
}

#[test]
fn test_event_scope_excludes_entries_without_event() {
    let mut persistence = create_test_persistence();
    record_update(&mut persistence, None, "Jane Doe", 0);
    let orphan = record_request("delete", None, Some(json!({"competitor_name": "No Event"})), None);
    record(&mut persistence, orphan, at(1)).unwrap();

    let unscoped = list_activity(&mut persistence, &ActivityQuery::default(), at(5)).unwrap();
    assert_eq!(unscoped.total, 2);

    let scoped = ActivityQuery {
        event_id: Some(String::from("evt-1")),
        ..ActivityQuery::default()
    };
    let page = list_activity(&mut persistence, &scoped, at(5)).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.activities[0].event_id.as_deref(), Some("evt-1"));
}

#[test]
fn test_unknown_season_yields_empty_page() {
    let mut persistence = create_test_persistence();
    record_update(&mut persistence, None, "Jane Doe", 0);

    let query = ActivityQuery {
        season_id: Some(String::from("s-1999")),
        ..ActivityQuery::default()
    };
    let page = list_activity(&mut persistence, &query, at(5)).unwrap();

    assert_eq!(page.total, 0);
    assert!(page.activities.is_empty());
}

#[test]
fn test_event_change_views() {
    let mut persistence = create_test_persistence();
    let moved = record_request(
        "update",
        None,
        Some(json!({"event_id": "evt-1", "competitor_name": "Jane Doe"})),
        Some(json!({"event_id": "evt-2", "competitor_name": "Jane Doe"})),
    );
    record(&mut persistence, moved, at(0)).unwrap();
    let deleted = record_request("delete", None, Some(json!({"event_id": "evt-2"})), None);
    record(&mut persistence, deleted, at(1)).unwrap();

    assert_eq!(get_event_modifications(&mut persistence, "evt-1").len(), 1);
    assert_eq!(get_event_modifications(&mut persistence, "evt-2").len(), 1);
    assert!(get_event_deletions(&mut persistence, "evt-1").is_empty());

    let deletions = get_event_deletions(&mut persistence, "evt-2");
    assert_eq!(deletions.len(), 1);
    assert_eq!(deletions[0].user_email.as_deref(), Some("pat@example.com"));
}

#[test]
fn test_event_all_logs_combines_views() {
    let mut persistence = create_test_persistence();
    open_test_session(&mut persistence, "evt-1", "termlab", 0);
    record_update(&mut persistence, None, "Jane Doe", 1);

    let logs = get_event_all_logs(&mut persistence, "evt-1", at(2));
    assert_eq!(logs.imports.len(), 1);
    assert_eq!(logs.modifications.len(), 1);
    assert!(logs.deletions.is_empty());
}

#[test]
fn test_audit_log_by_id() {
    let mut persistence = create_test_persistence();
    let entry = record(
        &mut persistence,
        record_request("create", None, None, Some(json!({"event_id": "evt-1"}))),
        at(0),
    )
    .unwrap();

    let view = get_audit_log_by_id(&mut persistence, entry.id().unwrap()).unwrap();
    assert_eq!(view.user_first_name.as_deref(), Some("Pat"));
    assert_eq!(view.user_last_name.as_deref(), Some("Admin"));

    let missing = get_audit_log_by_id(&mut persistence, 999);
    assert!(matches!(missing, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_session_audit_logs_are_oldest_first() {
    let mut persistence = create_test_persistence();
    let session = open_test_session(&mut persistence, "evt-1", "excel", 0);
    for (minutes, name) in [(3, "Late"), (1, "Early")] {
        let request = record_request(
            "create",
            Some(session.id),
            None,
            Some(json!({"event_id": "evt-1", "competitor_name": name})),
        );
        record(&mut persistence, request, at(minutes)).unwrap();
    }

    let logs = get_session_audit_logs(&mut persistence, session.id);
    let names: Vec<Option<String>> = logs
        .iter()
        .map(|view| view.entry.new_data().and_then(tally_domain::Snapshot::competitor_name))
        .collect();
    assert_eq!(names, vec![Some(String::from("Early")), Some(String::from("Late"))]);

    assert!(get_session_audit_logs(&mut persistence, 404).is_empty());
}

#[test]
fn test_list_all_sessions_searches_and_pages() {
    let mut persistence = create_test_persistence();
    open_test_session(&mut persistence, "evt-1", "excel", 0);
    open_test_session(&mut persistence, "evt-2", "manual", 1);
    open_test_session(&mut persistence, "evt-2", "termlab", 2);

    let finals = SessionListQuery {
        search: Some(String::from("summer")),
        limit: Some(1),
        ..SessionListQuery::default()
    };
    let page = list_all_sessions(&mut persistence, &finals, at(3));
    assert_eq!(page.total, 2);
    assert_eq!(page.sessions.len(), 1);
    assert_eq!(page.sessions[0].event_title, "Summer Finals");

    let scoped = SessionListQuery {
        event_id: Some(String::from("evt-1")),
        ..SessionListQuery::default()
    };
    assert_eq!(list_all_sessions(&mut persistence, &scoped, at(3)).total, 1);
}
