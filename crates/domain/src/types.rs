// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Provenance of a batch of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    /// Results keyed in by hand through the entry form.
    #[default]
    Manual,
    /// Results imported from an uploaded spreadsheet.
    Excel,
    /// Results imported from a TermLab export.
    Termlab,
}

impl EntryMethod {
    /// Converts this entry method to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Excel => "excel",
            Self::Termlab => "termlab",
        }
    }

    /// Human-readable label used in the activity feed.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Excel => "Excel",
            Self::Termlab => "TermLab",
        }
    }
}

impl FromStr for EntryMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "excel" => Ok(Self::Excel),
            "termlab" => Ok(Self::Termlab),
            _ => Err(DomainError::InvalidEntryMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for EntryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of mutation an audit entry records.
///
/// The action constrains which snapshots an entry carries:
/// - `Create` has only an after-snapshot
/// - `Update` has both
/// - `Delete` has only a before-snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A result row was created.
    Create,
    /// A result row was modified.
    Update,
    /// A result row was deleted.
    Delete,
}

impl AuditAction {
    /// Converts this action to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Whether entries with this action carry a before-snapshot.
    #[must_use]
    pub const fn requires_old_data(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }

    /// Whether entries with this action carry an after-snapshot.
    #[must_use]
    pub const fn requires_new_data(&self) -> bool {
        matches!(self, Self::Create | Self::Update)
    }
}

impl FromStr for AuditAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(DomainError::InvalidAuditAction(s.to_string())),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
