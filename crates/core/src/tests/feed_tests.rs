// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{at, create_test_directory, create_test_entry, create_test_session};
use crate::{
    ActivityFilter, ActivityInputs, ActivityPage, ActivityType, Directory, display_date,
    list_activity,
};
use serde_json::json;
use tally_audit::{AuditEntry, EntrySession};
use tally_domain::{AuditAction, EntryMethod};
use time::macros::date;

struct Fixture {
    sessions: Vec<EntrySession>,
    creates: Vec<AuditEntry>,
    changes: Vec<AuditEntry>,
    directory: Directory,
}

impl Fixture {
    fn new() -> Self {
        let sessions: Vec<EntrySession> = vec![
            create_test_session(1, "evt-1", EntryMethod::Excel, 0),
            create_test_session(2, "evt-2", EntryMethod::Manual, 30),
        ];
        let creates: Vec<AuditEntry> = vec![create_test_entry(
            100,
            AuditAction::Create,
            Some(1),
            None,
            Some(json!({ "competitor_name": "Jane Doe", "meca_id": "70123", "event_id": "evt-1" })),
            0,
        )];
        let changes: Vec<AuditEntry> = vec![
            create_test_entry(
                200,
                AuditAction::Update,
                None,
                Some(json!({ "event_id": "evt-1", "competitor_name": "Jane Doe", "score": 1 })),
                Some(json!({ "event_id": "evt-1", "competitor_name": "Jane Doe", "score": 2 })),
                10,
            ),
            create_test_entry(
                201,
                AuditAction::Delete,
                None,
                Some(json!({ "eventId": "evt-2", "competitor_name": "John Roe", "competition_class": "Street 3" })),
                None,
                20,
            ),
            create_test_entry(
                202,
                AuditAction::Delete,
                None,
                Some(json!({ "competitor_name": "No Event" })),
                None,
                40,
            ),
        ];
        Self {
            sessions,
            creates,
            changes,
            directory: create_test_directory(),
        }
    }

    fn list(&self, filter: &ActivityFilter) -> ActivityPage {
        list_activity(
            &ActivityInputs {
                sessions: &self.sessions,
                create_logs: &self.creates,
                change_logs: &self.changes,
                directory: &self.directory,
                as_of: at(50),
            },
            filter,
        )
    }
}

#[test]
fn test_unfiltered_feed_sorted_newest_first() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter::default());

    let ids: Vec<i64> = page.activities.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![202, 2, 201, 200, 1]);
    assert_eq!(page.total, 5);
}

#[test]
fn test_stats_sum_to_total_when_unrestricted() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter::default());

    assert_eq!(page.stats.new_entries, 2);
    assert_eq!(page.stats.modifications, 1);
    assert_eq!(page.stats.deletions, 2);
    assert_eq!(
        page.stats.new_entries + page.stats.modifications + page.stats.deletions,
        page.total
    );
}

#[test]
fn test_pagination_applies_after_stats() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        limit: Some(2),
        offset: Some(1),
        ..ActivityFilter::default()
    });

    assert_eq!(page.total, 5);
    assert_eq!(page.activities.len(), 2);
    assert_eq!(page.activities[0].id, 2);
    assert_eq!(page.stats.deletions, 2);
}

#[test]
fn test_action_type_filter() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        action_type: Some(ActivityType::Deletion),
        ..ActivityFilter::default()
    });

    assert_eq!(page.total, 2);
    assert_eq!(page.stats.new_entries, 0);
    assert!(page
        .activities
        .iter()
        .all(|a| a.action_type == ActivityType::Deletion));
}

#[test]
fn test_event_scope_excludes_entries_without_event() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        event_id: Some(String::from("evt-1")),
        ..ActivityFilter::default()
    });

    let ids: Vec<i64> = page.activities.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![200, 1]);
}

#[test]
fn test_season_scope_excludes_entries_without_event() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        season_id: Some(String::from("s-2026")),
        ..ActivityFilter::default()
    });

    assert_eq!(page.total, 4);
    assert!(page.activities.iter().all(|a| a.event_id.is_some()));
}

#[test]
fn test_empty_season_yields_empty_page() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        season_id: Some(String::from("s-1999")),
        ..ActivityFilter::default()
    });

    assert_eq!(page, ActivityPage::default());
}

#[test]
fn test_search_matches_competitor_and_class() {
    let fixture: Fixture = Fixture::new();

    let by_name: ActivityPage = fixture.list(&ActivityFilter {
        search: Some(String::from("jane")),
        ..ActivityFilter::default()
    });
    let ids: Vec<i64> = by_name.activities.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![200, 1]);

    let by_class: ActivityPage = fixture.list(&ActivityFilter {
        search: Some(String::from("STREET")),
        ..ActivityFilter::default()
    });
    assert_eq!(by_class.total, 1);
    assert_eq!(by_class.activities[0].id, 201);
}

#[test]
fn test_search_matches_membership_id_and_season() {
    let fixture: Fixture = Fixture::new();

    let by_meca: ActivityPage = fixture.list(&ActivityFilter {
        search: Some(String::from("70123")),
        ..ActivityFilter::default()
    });
    assert_eq!(by_meca.total, 1);
    assert_eq!(by_meca.activities[0].id, 1);

    let by_season: ActivityPage = fixture.list(&ActivityFilter {
        search: Some(String::from("2026 season")),
        ..ActivityFilter::default()
    });
    assert_eq!(by_season.total, 4);
}

#[test]
fn test_search_matches_rendered_event_date() {
    let page: ActivityPage = Fixture::new().list(&ActivityFilter {
        search: Some(String::from("jul 18")),
        ..ActivityFilter::default()
    });

    let ids: Vec<i64> = page.activities.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 201]);
}

#[test]
fn test_display_date_format() {
    assert_eq!(display_date(date!(2026 - 03 - 07)), "Mar 7, 2026");
    assert_eq!(display_date(date!(2026 - 11 - 21)), "Nov 21, 2026");
}
