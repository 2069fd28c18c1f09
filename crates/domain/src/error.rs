// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur while interpreting domain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The entry method is not one of `manual`, `excel`, `termlab`.
    InvalidEntryMethod(String),
    /// The audit action is not one of `create`, `update`, `delete`.
    InvalidAuditAction(String),
    /// A snapshot could not be decoded as a JSON object.
    InvalidSnapshot(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEntryMethod(value) => {
                write!(
                    f,
                    "Invalid entry method: '{value}'. Must be 'manual', 'excel' or 'termlab'"
                )
            }
            Self::InvalidAuditAction(value) => {
                write!(
                    f,
                    "Invalid audit action: '{value}'. Must be 'create', 'update' or 'delete'"
                )
            }
            Self::InvalidSnapshot(msg) => write!(f, "Invalid snapshot: {msg}"),
        }
    }
}

impl std::error::Error for DomainError {}
