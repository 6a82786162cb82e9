//! Per-invocation argument storage.
//!
//! An [`ArgumentBag`] is built by the resolver pipeline (see
//! `engine/resolve.rs`) and then handed, read-only, to the command handler.
//! Keys are argument names (`campaign_id`, `time_interval`, `fields`, ...).
//!
//! `Arg::None` is a real value: it means "no filter" and is distinct from a
//! key that is absent altogether.

use std::collections::BTreeMap;
use std::fmt;

/// A resolved argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// Explicitly "no filter / every item".
    None,
    Text(String),
    List(Vec<String>),
    Integer(i64),
    Number(f64),
    /// A flag that takes no value and was present.
    Switch,
}

impl Arg {
    /// Absent-equivalent for defaulting purposes: an empty text capture.
    pub fn is_empty(&self) -> bool {
        match self {
            Arg::Text(s) => s.trim().is_empty(),
            Arg::List(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Arg::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric view; text is parsed leniently.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Arg::Number(n) => Some(*n),
            Arg::Integer(i) => Some(*i as f64),
            Arg::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Arg::Integer(i) => Some(*i),
            Arg::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            Arg::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::None => f.write_str("None"),
            Arg::Text(s) => f.write_str(s),
            Arg::List(items) => f.write_str(&items.join(",")),
            Arg::Integer(i) => write!(f, "{i}"),
            Arg::Number(n) => write!(f, "{n}"),
            Arg::Switch => f.write_str("true"),
        }
    }
}

/// Mutable map from argument name to resolved value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentBag {
    values: BTreeMap<String, Arg>,
}

impl ArgumentBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Arg) {
        self.values.insert(name.into(), value);
    }

    /// Insert only when `name` is not already present. Returns whether the
    /// value was stored.
    pub fn insert_if_absent(&mut self, name: &str, value: Arg) -> bool {
        if self.values.contains_key(name) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// True when `name` is missing or holds an empty capture.
    pub fn is_absent(&self, name: &str) -> bool {
        self.values.get(name).is_none_or(Arg::is_empty)
    }

    /// True when `name` was resolved to the "no filter" sentinel.
    pub fn is_none(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Arg::None))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Arg::as_text)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Arg::as_number)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Arg::as_integer)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.values.get(name) {
            Some(Arg::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn switch(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(Arg::Switch))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_if_absent_keeps_existing_value() {
        let mut bag = ArgumentBag::new();
        bag.insert("time_interval", Arg::Text("7d".into()));

        assert!(!bag.insert_if_absent("time_interval", Arg::Text("360d".into())));
        assert!(bag.insert_if_absent("fields", Arg::List(vec!["id".into()])));
        assert_eq!(bag.text("time_interval"), Some("7d"));
        assert_eq!(bag.list("fields"), Some(&["id".to_string()][..]));
    }

    #[test]
    fn empty_text_counts_as_absent_but_none_does_not() {
        let mut bag = ArgumentBag::new();
        bag.insert("time_interval", Arg::Text("  ".into()));
        bag.insert("campaign_id", Arg::None);

        assert!(bag.is_absent("time_interval"));
        assert!(bag.is_absent("missing"));
        assert!(!bag.is_absent("campaign_id"));
        assert!(bag.is_none("campaign_id"));
    }

    #[test]
    fn numeric_views_accept_text() {
        let mut bag = ArgumentBag::new();
        bag.insert("threshold", Arg::Text("2.5".into()));
        bag.insert("filter_limit", Arg::Number(5.0));

        assert_eq!(bag.number("threshold"), Some(2.5));
        assert_eq!(bag.integer("filter_limit"), Some(5));
        assert_eq!(bag.integer("threshold"), None);
    }
}
