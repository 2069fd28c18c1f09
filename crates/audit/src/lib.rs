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
    clippy::unwrap_used,
    clippy::expect_used
)]

mod entry;
mod error;
mod session;

#[cfg(test)]
mod tests;

pub use entry::{AuditEntry, NewAuditEntry};
pub use error::AuditError;
pub use session::{
    ARTIFACT_ATTACH_GRACE, EntrySession, NewEntrySession, OPEN_SESSION_GRACE, SessionClosure,
    validate_result_count,
};
