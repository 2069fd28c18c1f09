// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Field-level differences between two snapshots.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tally_domain::{Snapshot, canonical_key};

/// Canonical keys never reported as changes.
///
/// Ids, timestamps, ORM bookkeeping, foreign keys and revision metadata.
pub const SKIP_FIELDS: &[&str] = &[
    "id",
    "created_at",
    "updated_at",
    "event_id",
    "competitor",
    "event",
    "competitor_id",
    "__entity",
    "__helper",
    "__meta",
    "class_id",
    "season_id",
    "created_by",
    "updated_by",
    "revision_count",
    "modification_reason",
    "deletion_reason",
];

/// Display labels for well-known result fields, in display order.
pub const FIELD_LABELS: &[(&str, &str)] = &[
    ("competitor_name", "Competitor Name"),
    ("meca_id", "MECA ID"),
    ("competition_class", "Competition Class"),
    ("format", "Format"),
    ("score", "Score"),
    ("placement", "Placement"),
    ("points_earned", "Points Earned"),
    ("wattage", "Wattage"),
    ("frequency", "Frequency"),
    ("vehicle_info", "Vehicle Info"),
    ("notes", "Notes"),
];

/// One field that differs between the before and after snapshots.
///
/// A side on which the field is absent is reported as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub key: String,
    pub label: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Returns true if the key is excluded from diffs.
#[must_use]
pub fn is_skipped(key: &str) -> bool {
    let canonical: String = canonical_key(key);
    SKIP_FIELDS.contains(&canonical.as_str())
}

/// The display label for a field key in either naming convention.
#[must_use]
pub fn field_label(key: &str) -> String {
    let canonical: String = canonical_key(key);
    FIELD_LABELS
        .iter()
        .find(|(known, _)| *known == canonical)
        .map_or_else(|| humanize_key(&canonical), |(_, label)| (*label).to_string())
}

/// Turns `vehicle_make` into `Vehicle Make`.
#[must_use]
pub fn humanize_key(key: &str) -> String {
    canonical_key(key)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Structural equality of decoded JSON with numbers compared by value.
///
/// `120` and `120.0` are equal; `"120"` and `120` are not.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y).is_eq(),
                _ => false,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Computes the changed fields between two snapshots.
///
/// Keys from both sides are collapsed to canonical form before comparison,
/// so `competitorName` and `competitor_name` are the same field. Skipped
/// keys and keys that are null or absent on both sides never appear.
/// Known fields come first in label order, then the rest alphabetically.
#[must_use]
pub fn diff_snapshots(old: Option<&Snapshot>, new: Option<&Snapshot>) -> Vec<FieldChange> {
    let old_fields: BTreeMap<String, &Value> = old.map(Snapshot::normalized).unwrap_or_default();
    let new_fields: BTreeMap<String, &Value> = new.map(Snapshot::normalized).unwrap_or_default();

    let keys: BTreeSet<&String> = old_fields.keys().chain(new_fields.keys()).collect();

    let mut changes: Vec<FieldChange> = keys
        .into_iter()
        .filter(|key| !SKIP_FIELDS.contains(&key.as_str()))
        .filter_map(|key| {
            let old_value: Value = old_fields.get(key).map_or(Value::Null, |v| (*v).clone());
            let new_value: Value = new_fields.get(key).map_or(Value::Null, |v| (*v).clone());
            if old_value.is_null() && new_value.is_null() {
                return None;
            }
            if values_equal(&old_value, &new_value) {
                return None;
            }
            Some(FieldChange {
                key: key.clone(),
                label: field_label(key),
                old_value,
                new_value,
            })
        })
        .collect();

    changes.sort_by_key(|change| (display_rank(&change.key), change.key.clone()));
    changes
}

fn display_rank(key: &str) -> usize {
    FIELD_LABELS
        .iter()
        .position(|(known, _)| *known == key)
        .unwrap_or(FIELD_LABELS.len())
}
