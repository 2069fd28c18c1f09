// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::{HashMap, HashSet};
use time::Date;

/// Title shown for an event id with no directory row.
pub const UNKNOWN_EVENT: &str = "Unknown Event";
/// Name shown for an actor with no directory row.
pub const UNKNOWN_USER: &str = "Unknown";
/// Membership status for a competitor with no matching profile.
pub const NO_MEMBERSHIP: &str = "none";

/// An event as the host application lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInfo {
    pub event_id: String,
    pub title: String,
    pub event_date: Option<Date>,
    pub season_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonInfo {
    pub season_id: String,
    pub name: String,
}

/// A user or member profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileInfo {
    pub profile_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub meca_id: Option<String>,
    pub membership_status: Option<String>,
}

impl ProfileInfo {
    /// Full name, falling back to the email address.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let full: String = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();

        if full.is_empty() {
            self.email.clone()
        } else {
            Some(full)
        }
    }
}

/// Read-only lookups over the host application's events, seasons and profiles.
///
/// Every accessor tolerates missing rows.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    events: HashMap<String, EventInfo>,
    seasons: HashMap<String, SeasonInfo>,
    profiles: HashMap<String, ProfileInfo>,
    memberships: HashMap<String, String>,
}

impl Directory {
    #[must_use]
    pub fn new(events: Vec<EventInfo>, seasons: Vec<SeasonInfo>, profiles: Vec<ProfileInfo>) -> Self {
        let memberships: HashMap<String, String> = profiles
            .iter()
            .filter_map(|profile| {
                let meca_id: &str = profile.meca_id.as_deref()?.trim();
                if meca_id.is_empty() {
                    return None;
                }
                let status: String = profile
                    .membership_status
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| NO_MEMBERSHIP.to_string());
                Some((meca_id.to_string(), status))
            })
            .collect();

        Self {
            events: events.into_iter().map(|e| (e.event_id.clone(), e)).collect(),
            seasons: seasons.into_iter().map(|s| (s.season_id.clone(), s)).collect(),
            profiles: profiles
                .into_iter()
                .map(|p| (p.profile_id.clone(), p))
                .collect(),
            memberships,
        }
    }

    #[must_use]
    pub fn event(&self, event_id: &str) -> Option<&EventInfo> {
        self.events.get(event_id)
    }

    #[must_use]
    pub fn event_title(&self, event_id: &str) -> String {
        self.event(event_id)
            .map_or_else(|| UNKNOWN_EVENT.to_string(), |e| e.title.clone())
    }

    #[must_use]
    pub fn season_name(&self, season_id: &str) -> Option<&str> {
        self.seasons.get(season_id).map(|s| s.name.as_str())
    }

    /// Ids of all events that belong to a season.
    #[must_use]
    pub fn event_ids_in_season(&self, season_id: &str) -> HashSet<String> {
        self.events
            .values()
            .filter(|e| e.season_id.as_deref() == Some(season_id))
            .map(|e| e.event_id.clone())
            .collect()
    }

    #[must_use]
    pub fn profile(&self, profile_id: &str) -> Option<&ProfileInfo> {
        self.profiles.get(profile_id)
    }

    /// Name of an actor: full name, else email, else `Unknown`.
    #[must_use]
    pub fn user_name(&self, profile_id: &str) -> String {
        self.profile(profile_id)
            .and_then(ProfileInfo::display_name)
            .unwrap_or_else(|| UNKNOWN_USER.to_string())
    }

    #[must_use]
    pub fn user_email(&self, profile_id: &str) -> Option<String> {
        self.profile(profile_id).and_then(|p| p.email.clone())
    }

    /// Membership status of a competitor by membership id, `none` if unknown.
    #[must_use]
    pub fn membership_status(&self, meca_id: Option<&str>) -> String {
        meca_id
            .and_then(|id| self.memberships.get(id.trim()))
            .cloned()
            .unwrap_or_else(|| NO_MEMBERSHIP.to_string())
    }
}
