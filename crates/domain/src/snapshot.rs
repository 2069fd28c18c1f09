// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Loosely typed record snapshots.
//!
//! A snapshot is the full JSON object of a result row captured at the moment
//! of a mutation. Snapshots written by different schema versions use either
//! `snake_case` or `camelCase` keys for the same logical field, so every
//! lookup goes through [`canonical_key`].

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Canonical key of the embedded event reference.
pub const EVENT_ID: &str = "event_id";
/// Canonical key of the competitor display name.
pub const COMPETITOR_NAME: &str = "competitor_name";
/// Canonical key of the competitor membership id.
pub const MECA_ID: &str = "meca_id";
/// Canonical key of the competition class.
pub const COMPETITION_CLASS: &str = "competition_class";
/// Canonical key of the competition format.
pub const FORMAT: &str = "format";
/// Canonical key of the score.
pub const SCORE: &str = "score";

/// Normalizes a snapshot key to its `snake_case` form.
///
/// `competitorName`, `competitor_name` and `CompetitorName` all map to
/// `competitor_name`. Runs of capitals are treated as one word
/// (`vehicleVIN` becomes `vehicle_vin`).
#[must_use]
pub fn canonical_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out: String = String::with_capacity(key.len() + 4);

    for (idx, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev: Option<char> = idx.checked_sub(1).map(|p| chars[p]);
            let next: Option<char> = chars.get(idx + 1).copied();
            let starts_word: bool = match prev {
                None | Some('_') => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                Some(_) => false,
            };
            if starts_word {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// A full before/after copy of a record, stored verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(Map<String, Value>);

impl Snapshot {
    /// Creates a snapshot from a JSON object.
    #[must_use]
    pub const fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Creates a snapshot from an arbitrary JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(DomainError::InvalidSnapshot(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decodes a snapshot from its stored JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object.
    pub fn parse(json: &str) -> Result<Self, DomainError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| DomainError::InvalidSnapshot(e.to_string()))?;
        Self::from_value(value)
    }

    /// Encodes the snapshot as compact JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// The raw fields, with keys exactly as written.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns true if the snapshot has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a field by canonical key, accepting any naming variant.
    ///
    /// When a snapshot carries both variants of one field, a non-null value
    /// wins over null, and the `snake_case` key wins a tie.
    #[must_use]
    pub fn get(&self, canonical: &str) -> Option<&Value> {
        let mut found: Option<(&String, &Value)> = None;
        for (key, value) in &self.0 {
            if canonical_key(key) != canonical {
                continue;
            }
            found = match found {
                None => Some((key, value)),
                Some(current) => Some(prefer(current, (key, value))),
            };
        }
        found.map(|(_, value)| value)
    }

    /// Looks up a field and renders it as text.
    ///
    /// Strings are returned trimmed; numbers and booleans are rendered.
    /// Empty strings, nulls, arrays and objects yield `None`.
    #[must_use]
    pub fn text(&self, canonical: &str) -> Option<String> {
        match self.get(canonical)? {
            Value::String(s) => {
                let trimmed: &str = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// The event this record belonged to, read from `event_id` or `eventId`.
    #[must_use]
    pub fn event_id(&self) -> Option<String> {
        self.text(EVENT_ID)
    }

    /// The competitor display name.
    #[must_use]
    pub fn competitor_name(&self) -> Option<String> {
        self.text(COMPETITOR_NAME)
    }

    /// The competitor membership id.
    #[must_use]
    pub fn meca_id(&self) -> Option<String> {
        self.text(MECA_ID)
    }

    /// The competition class.
    #[must_use]
    pub fn competition_class(&self) -> Option<String> {
        self.text(COMPETITION_CLASS)
    }

    /// The competition format.
    #[must_use]
    pub fn format(&self) -> Option<String> {
        self.text(FORMAT)
    }

    /// Collapses naming variants, keyed by canonical key.
    ///
    /// Variant collisions are resolved the same way as [`Snapshot::get`].
    #[must_use]
    pub fn normalized(&self) -> BTreeMap<String, &Value> {
        let mut by_key: BTreeMap<String, (&String, &Value)> = BTreeMap::new();
        for (key, value) in &self.0 {
            let canonical: String = canonical_key(key);
            let entry = match by_key.remove(&canonical) {
                None => (key, value),
                Some(current) => prefer(current, (key, value)),
            };
            by_key.insert(canonical, entry);
        }
        by_key
            .into_iter()
            .map(|(canonical, (_, value))| (canonical, value))
            .collect()
    }
}

impl From<Map<String, Value>> for Snapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Snapshot {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn prefer<'a>(
    current: (&'a String, &'a Value),
    candidate: (&'a String, &'a Value),
) -> (&'a String, &'a Value) {
    match (current.1.is_null(), candidate.1.is_null()) {
        (true, false) => candidate,
        (false, true) => current,
        _ => {
            let current_is_snake: bool = canonical_key(current.0) == *current.0;
            let candidate_is_snake: bool = canonical_key(candidate.0) == *candidate.0;
            if candidate_is_snake && !current_is_snake {
                candidate
            } else {
                current
            }
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
