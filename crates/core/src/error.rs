// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use tally_domain::DomainError;

/// Errors raised while interpreting feed queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A domain value could not be interpreted.
    DomainViolation(DomainError),
    /// The activity type filter is not recognised.
    InvalidActivityType(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DomainViolation(err) => write!(f, "Domain violation: {err}"),
            Self::InvalidActivityType(value) => write!(
                f,
                "Invalid activity type: '{value}'. Must be 'new_entry', 'modification', 'deletion' or 'all'"
            ),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::DomainViolation(err)
    }
}
