// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::activity::{Activity, ActivityInputs, ActivityType, build_activities, display_date};
use serde::Serialize;
use std::collections::HashSet;

/// Page size used when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Narrowing applied to the activity feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub search: Option<String>,
    pub season_id: Option<String>,
    pub event_id: Option<String>,
    /// `None` means every type.
    pub action_type: Option<ActivityType>,
}

/// Per-type counts over the filtered feed, before pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStats {
    pub new_entries: usize,
    pub modifications: usize,
    pub deletions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub activities: Vec<Activity>,
    pub total: usize,
    pub stats: ActivityStats,
}

/// Reconstructs, filters, counts, sorts and pages the activity feed.
///
/// A season with no events yields an empty page. Activities without a
/// recoverable event id are dropped from season- or event-scoped queries
/// and kept otherwise.
#[must_use]
pub fn list_activity(inputs: &ActivityInputs<'_>, filter: &ActivityFilter) -> ActivityPage {
    let season_events: Option<HashSet<String>> = filter
        .season_id
        .as_deref()
        .map(|season_id| inputs.directory.event_ids_in_season(season_id));
    if season_events.as_ref().is_some_and(HashSet::is_empty) {
        return ActivityPage::default();
    }

    let needle: Option<String> = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut activities: Vec<Activity> = build_activities(inputs)
        .into_iter()
        .filter(|a| {
            season_events.as_ref().is_none_or(|ids| {
                a.event_id.as_ref().is_some_and(|id| ids.contains(id))
            })
        })
        .filter(|a| {
            filter
                .event_id
                .as_deref()
                .is_none_or(|wanted| a.event_id.as_deref() == Some(wanted))
        })
        .filter(|a| filter.action_type.is_none_or(|t| a.action_type == t))
        .filter(|a| needle.as_deref().is_none_or(|n| matches_search(a, n)))
        .collect();

    let stats: ActivityStats = count_by_type(&activities);

    sort_newest_first(&mut activities);
    let total: usize = activities.len();
    let offset: usize = filter.offset.unwrap_or(0);
    let limit: usize = filter.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_LIMIT);

    ActivityPage {
        activities: activities.into_iter().skip(offset).take(limit).collect(),
        total,
        stats,
    }
}

/// Date descending, newest id first on ties.
pub fn sort_newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.id.cmp(&a.id))
            .then_with(|| a.source_type.cmp(&b.source_type))
    });
}

fn count_by_type(activities: &[Activity]) -> ActivityStats {
    activities
        .iter()
        .fold(ActivityStats::default(), |mut stats, a| {
            match a.action_type {
                ActivityType::NewEntry => stats.new_entries += 1,
                ActivityType::Modification => stats.modifications += 1,
                ActivityType::Deletion => stats.deletions += 1,
            }
            stats
        })
}

/// Case-insensitive match of an already lowercased needle.
#[must_use]
pub fn matches_search(activity: &Activity, needle: &str) -> bool {
    let hit = |text: Option<&str>| text.is_some_and(|t| t.to_lowercase().contains(needle));

    hit(Some(&activity.user_name))
        || hit(activity.user_email.as_deref())
        || hit(activity.event_title.as_deref())
        || hit(activity.season_name.as_deref())
        || hit(activity.competition_class.as_deref())
        || hit(activity.format.as_deref())
        || activity.competitor_names.iter().any(|n| hit(Some(n)))
        || activity.competitor_details.iter().any(|d| {
            hit(d.meca_id.as_deref())
                || hit(Some(&d.competitor_name))
                || hit(d.competition_class.as_deref())
                || hit(d.format.as_deref())
        })
        || activity
            .event_date
            .is_some_and(|date| hit(Some(&display_date(date))))
        || hit(Some(&display_date(activity.date.date())))
}
