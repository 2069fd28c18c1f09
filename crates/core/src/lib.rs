// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

pub mod activity;
pub mod diff;
pub mod directory;
mod error;
mod feed;
mod sessions;
mod views;

#[cfg(test)]
mod tests;

pub use activity::{
    Activity, ActivityInputs, ActivityType, CompetitorDetail, GroupedLog, SourceType,
    build_activities, display_date,
};
pub use diff::{FieldChange, diff_snapshots, field_label, values_equal};
pub use directory::{Directory, EventInfo, ProfileInfo, SeasonInfo};
pub use error::CoreError;
pub use feed::{
    ActivityFilter, ActivityPage, ActivityStats, DEFAULT_PAGE_LIMIT, list_activity,
    matches_search, sort_newest_first,
};
pub use sessions::{SessionEntry, SessionPage, SessionSummary, page_sessions, summarize_sessions};
pub use views::{AuditLogView, EventLogs, event_log_views, touches_event};
