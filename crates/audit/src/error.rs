// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tally_domain::AuditAction;
use thiserror::Error;
use time::OffsetDateTime;

/// Rule violations detected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("'{action}' entries require a before-snapshot")]
    MissingOldData { action: AuditAction },

    #[error("'{action}' entries must not carry a before-snapshot")]
    UnexpectedOldData { action: AuditAction },

    #[error("'{action}' entries require an after-snapshot")]
    MissingNewData { action: AuditAction },

    #[error("'{action}' entries must not carry an after-snapshot")]
    UnexpectedNewData { action: AuditAction },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("result count must not be negative, got {count}")]
    NegativeResultCount { count: i64 },

    #[error("session {session_id} closed at {closed_at}; its file path can no longer change")]
    ArtifactWindowClosed {
        session_id: i64,
        closed_at: OffsetDateTime,
    },
}
