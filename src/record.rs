//! Result records.
//!
//! A [`Record`] is a flat mapping from field name to scalar JSON value. Records
//! coming from different backends use different native names for the same
//! concept (`spent` vs `cost`, `conversions` vs `conv`); the accessors on
//! [`MergedRecord`] know the aliases.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Field names holding spend, in lookup order.
pub const COST_FIELDS: &[&str] = &["cost", "spent"];
/// Field names holding conversions, in lookup order.
pub const CONVERSION_FIELDS: &[&str] = &["conv", "conversions"];
/// Name of the derived cost-per-acquisition field.
pub const CPA_FIELD: &str = "cpa";

/// One campaign, widget, source or stat row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The `id` field rendered as a string (numbers lose no precision).
    pub fn id(&self) -> Option<String> {
        self.get("id").and_then(scalar_to_string)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    /// Numeric view of a field; numeric strings are accepted.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// First numeric field found among `keys`.
    pub fn first_number(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.number(k))
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, Value> {
        self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect::<Map<String, Value>>())
    }

    /// Convert a JSON object into a record; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Record(map.into_iter().collect())),
            _ => None,
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Record(map)
    }
}

/// Render a scalar JSON value as plain text. Objects and arrays yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON number from an `f64`; non-finite values become `null`.
pub fn number_value(n: f64) -> Value {
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// A platform record unioned with its tracker counterpart.
///
/// Stored fields are `{**tracker, **platform}`: on a name clash the platform
/// value wins. Derived fields are not stored; [`MergedRecord::cpa`] is
/// computed on every read and only materialised by [`MergedRecord::as_record`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    fields: Record,
}

impl MergedRecord {
    pub fn new(platform: Record, tracker: Option<Record>) -> Self {
        let mut fields = tracker.unwrap_or_default();
        for (key, value) in platform.into_map() {
            fields.insert(key, value);
        }
        MergedRecord { fields }
    }

    /// Wrap an already-merged (or single-source) record.
    pub fn from_record(fields: Record) -> Self {
        MergedRecord { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn id(&self) -> Option<String> {
        self.fields.id()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.number(key)
    }

    pub fn cost(&self) -> Option<f64> {
        self.fields.first_number(COST_FIELDS)
    }

    pub fn conversions(&self) -> f64 {
        self.fields.first_number(CONVERSION_FIELDS).unwrap_or(0.0)
    }

    /// Cost per acquisition; zero conversions yield zero. `None` without a
    /// cost field.
    pub fn cpa(&self) -> Option<f64> {
        let cost = self.cost()?;
        let conversions = self.conversions();
        Some(if conversions == 0.0 { 0.0 } else { cost / conversions })
    }

    /// Stored fields only.
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    /// Mapping view including derived fields.
    pub fn as_record(&self) -> Record {
        let mut record = self.fields.clone();
        if let Some(cpa) = self.cpa() {
            record.insert(CPA_FIELD, number_value(cpa));
        }
        record
    }

    pub fn into_record(self) -> Record {
        let cpa = self.cpa();
        let mut record = self.fields;
        if let Some(cpa) = cpa {
            record.insert(CPA_FIELD, number_value(cpa));
        }
        record
    }
}
