//! Cross-source reconciliation.
//!
//! Platform records and tracker records describe the same campaigns under
//! different ids. A platform campaign is linked to its tracker campaign by the
//! numeric prefix of its name:
//!
//! ```text
//! platform {id: 5, name: "10013 - Summer Promo", spent: 50}
//!                         ^^^^^ join key
//! tracker  {id: "10013", conv: 4, rev: 120}
//!       => {id: 5, name: "10013 - Summer Promo", spent: 50, conv: 4, rev: 120}   cpa = 12.5
//! ```
//!
//! Records without a key cannot be joined. They are reported in an
//! [`ErrorList`] (or fail the call in [`JoinMode::Strict`]) and left out of
//! the result. Keyed records with no tracker counterpart are dropped silently.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;
use tracing::warn;

use crate::Platform;
use crate::error::{Error, ErrorEntry, ErrorList};
use crate::record::{MergedRecord, Record, number_value};

/// Message of the entry reported for an unjoinable record.
pub const MISSING_TRACKER_ID: &str = "Missing Tracker ID Reference";

/// What to do with a platform record that has no join key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Report it in the error list and carry on.
    #[default]
    Lenient,
    /// Fail the whole merge with [`Error::UnjoinableRecord`].
    Strict,
}

/// Output of [`merge_tracker_stats`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub merged: Vec<MergedRecord>,
    pub errors: ErrorList,
}

/// Join key of a platform record name: its leading run of digits, which must
/// be followed by a space.
pub fn join_key(name: &str) -> Option<&str> {
    regex!(r"^(\d+) ").captures(name).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Join platform records with tracker records.
///
/// A tracker side consisting of a single empty record is a placeholder for
/// "no tracker data": the platform records are returned unmerged.
pub fn merge_tracker_stats(
    stats: Vec<Record>,
    tracker: &[Record],
    platform: Platform,
    mode: JoinMode,
) -> Result<Reconciled, Error> {
    if tracker.len() == 1 && tracker[0].is_empty() {
        return Ok(Reconciled { merged: stats.into_iter().map(MergedRecord::from_record).collect(), errors: ErrorList::new() });
    }

    let mut out = Reconciled::default();
    for stat in stats {
        let name = stat.name().unwrap_or_default().to_string();
        let Some(key) = join_key(&name) else {
            let id = stat.id().unwrap_or_default();
            if mode == JoinMode::Strict {
                return Err(Error::UnjoinableRecord { platform, id, name });
            }
            warn!(%platform, id = %id, name = %name, "record has no tracker id in its name");
            out.errors.push(ErrorEntry::new(MISSING_TRACKER_ID).with_id(id).with_name(name).with_platform(platform));
            continue;
        };

        let counterpart = tracker.iter().filter(|t| !t.is_empty()).find(|t| t.id().as_deref() == Some(key));
        if let Some(counterpart) = counterpart {
            out.merged.push(MergedRecord::new(stat, Some(counterpart.clone())));
        }
    }
    Ok(out)
}

/// Which keys [`merge_by_key`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMerge {
    /// Keys present on both sides.
    Common,
    /// Common keys, then keys unique to the left, then keys unique to the right.
    Outer,
}

/// Merge two record lists on `key`.
///
/// Records sharing a key are combined field by field: numeric fields present
/// on both sides are summed, any other clash keeps the left value. Records
/// missing `key` are ignored. Output order follows the left list, then the
/// right list.
pub fn merge_by_key(left: &[Record], right: &[Record], key: &str, mode: KeyMerge) -> Vec<Record> {
    let right_index: HashMap<String, &Record> =
        right.iter().filter_map(|r| r.text(key).map(|k| (k, r))).rev().collect();
    let left_keys: HashMap<String, ()> = left.iter().filter_map(|r| r.text(key)).map(|k| (k, ())).collect();

    let mut common = Vec::new();
    let mut left_only = Vec::new();
    for record in left {
        let Some(k) = record.text(key) else { continue };
        match right_index.get(&k) {
            Some(other) => common.push(combine(record, other, key)),
            None => left_only.push(record.clone()),
        }
    }

    if mode == KeyMerge::Common {
        return common;
    }

    let right_only = right.iter().filter(|r| r.text(key).is_some_and(|k| !left_keys.contains_key(&k))).cloned();
    common.into_iter().chain(left_only).chain(right_only).collect()
}

fn combine(left: &Record, right: &Record, key: &str) -> Record {
    let mut fields: BTreeMap<String, Value> = right.as_map().clone();
    for (name, value) in left.iter() {
        let summed = match (value, right.get(name)) {
            _ if name == key => None,
            (Value::Number(a), Some(Value::Number(b))) => a.as_f64().zip(b.as_f64()).map(|(a, b)| sum(a, b)),
            _ => None,
        };
        fields.insert(name.to_string(), summed.unwrap_or_else(|| value.clone()));
    }
    Record::from(fields)
}

fn sum(a: f64, b: f64) -> Value {
    let total = a + b;
    if total.fract() == 0.0 && total.abs() < i64::MAX as f64 { Value::from(total as i64) } else { number_value(total) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn join_key_requires_digits_then_space() {
        assert_eq!(join_key("10013 - Summer Promo"), Some("10013"));
        assert_eq!(join_key("10013 Summer"), Some("10013"));
        assert_eq!(join_key("Summer 10013"), None);
        assert_eq!(join_key("10013"), None);
        assert_eq!(join_key("10013-Summer"), None);
    }

    #[test]
    fn joined_record_takes_platform_identity_and_tracker_metrics() {
        let stats = vec![rec(json!({"id": 5, "name": "10013 Summer", "spent": 50.0}))];
        let tracker = [rec(json!({"id": "10013", "name": "Summer", "conv": 4, "rev": 120}))];

        let out = merge_tracker_stats(stats, &tracker, Platform::Mgid, JoinMode::Lenient).unwrap();

        assert!(out.errors.is_empty());
        let merged = &out.merged[0];
        assert_eq!(merged.id().as_deref(), Some("5"));
        assert_eq!(merged.number("rev"), Some(120.0));
        assert_eq!(merged.cpa(), Some(12.5));
    }

    #[test]
    fn unjoinable_records_are_reported_and_excluded() {
        let stats = vec![
            rec(json!({"id": 1, "name": "No Key"})),
            rec(json!({"id": 2, "name": "10013 Keyed"})),
            rec(json!({"id": 3, "name": "777 Unmatched"})),
        ];
        let tracker = [rec(json!({"id": 10013, "conv": 1}))];

        let out = merge_tracker_stats(stats, &tracker, Platform::Zeropark, JoinMode::Lenient).unwrap();

        assert_eq!(out.merged.len(), 1);
        assert_eq!(out.merged[0].id().as_deref(), Some("2"));
        assert_eq!(out.errors.len(), 1);
        let entry = out.errors.iter().next().unwrap();
        assert_eq!(entry.message, MISSING_TRACKER_ID);
        assert_eq!(entry.id.as_deref(), Some("1"));
        assert_eq!(entry.name.as_deref(), Some("No Key"));
        assert_eq!(entry.platform, Some(Platform::Zeropark));
    }

    #[test]
    fn strict_mode_fails_on_unjoinable_records() {
        let stats = vec![rec(json!({"id": 1, "name": "No Key"}))];
        let err = merge_tracker_stats(stats, &[rec(json!({"id": 1}))], Platform::Mgid, JoinMode::Strict).unwrap_err();
        assert!(matches!(err, Error::UnjoinableRecord { ref id, .. } if id == "1"));
    }

    #[test]
    fn placeholder_tracker_returns_platform_records_unmerged() {
        let stats = vec![rec(json!({"id": 1, "name": "No Key"}))];
        let out = merge_tracker_stats(stats, &[Record::new()], Platform::Mgid, JoinMode::Strict).unwrap();
        assert_eq!(out.merged.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[test]
    fn first_matching_tracker_record_wins() {
        let stats = vec![rec(json!({"id": 1, "name": "9 A"}))];
        let tracker = [rec(json!({"id": 9, "rev": 1})), rec(json!({"id": 9, "rev": 2}))];
        let out = merge_tracker_stats(stats, &tracker, Platform::Mgid, JoinMode::Lenient).unwrap();
        assert_eq!(out.merged[0].number("rev"), Some(1.0));
    }

    #[test]
    fn merge_by_key_sums_overlapping_numbers() {
        let left = [rec(json!({"id": "w1", "clicks": 10, "name": "left"})), rec(json!({"id": "w2", "clicks": 1}))];
        let right = [rec(json!({"id": "w1", "clicks": 5, "name": "right", "conv": 2})), rec(json!({"id": "w3"}))];

        let common = merge_by_key(&left, &right, "id", KeyMerge::Common);
        assert_eq!(common, [rec(json!({"id": "w1", "clicks": 15, "name": "left", "conv": 2}))]);

        let outer = merge_by_key(&left, &right, "id", KeyMerge::Outer);
        let ids: Vec<_> = outer.iter().filter_map(Record::id).collect();
        assert_eq!(ids, ["w1", "w2", "w3"]);
    }
}
