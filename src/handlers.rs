//! Verb handlers.
//!
//! A handler receives a fully resolved [`Invocation`] and talks to the
//! backends. It returns an [`Outcome`] (data plus non-fatal errors) or a fatal
//! [`Error`]. Projection, limiting and rendering happen afterwards, in
//! `api.rs`, so handlers return whole records.
//!
//! - `campaigns.rs`: ad-network campaign verbs (`list`, `stats`, `spent`, `bot-traffic`).
//! - `widgets.rs`: per-widget verbs, including the ones that pause/resume.
//! - `tracker.rs`: verbs addressed to the tracker itself.

use std::collections::BTreeSet;

use crate::api::Context;
use crate::bag::{Arg, ArgumentBag};
use crate::config::Settings;
use crate::engine::Route;
use crate::error::{Error, ErrorList};
use crate::platform::{AdNetwork, Backends, TimeWindow};
use crate::reconcile::JoinMode;
use crate::record::Record;
use crate::rules::helpers::{parse_date_range, parse_interval, window_bounds};
use crate::{Command, Platform};

pub(crate) mod campaigns;
pub(crate) mod tracker;
pub(crate) mod widgets;

/// Name under which tracker click counts are kept next to platform clicks.
pub(crate) const TRACKER_CLICKS: &str = "thrive_clicks";

/// Handler output.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Records(Vec<Record>),
    /// Acknowledgement or field listing; bypasses projection.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub body: Body,
    pub errors: ErrorList,
}

impl Outcome {
    pub fn records(records: Vec<Record>) -> Self {
        Outcome { body: Body::Records(records), errors: ErrorList::new() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Outcome { body: Body::Text(text.into()), errors: ErrorList::new() }
    }

    /// `list-fields` answer: one name per line, sorted, deduplicated.
    pub fn field_list(fields: impl IntoIterator<Item = String>) -> Self {
        let fields: BTreeSet<String> = fields.into_iter().collect();
        Self::text(fields.into_iter().collect::<Vec<_>>().join("\n"))
    }

    pub fn with_errors(mut self, errors: ErrorList) -> Self {
        self.errors.extend(errors);
        self
    }

    /// True when there is nothing to show in the body.
    pub fn is_empty(&self) -> bool {
        match &self.body {
            Body::Records(records) => records.is_empty(),
            Body::Text(text) => text.trim().is_empty(),
        }
    }
}

/// Everything a handler may read.
pub(crate) struct Invocation<'a> {
    pub platform: Platform,
    pub command: Command,
    pub args: &'a ArgumentBag,
    pub backends: &'a Backends,
    pub settings: &'a Settings,
    pub context: &'a Context,
    pub route: &'a Route,
}

impl<'a> Invocation<'a> {
    pub fn network(&self) -> Result<&'a dyn AdNetwork, Error> {
        Ok(self.backends.network(self.platform)?)
    }

    /// Campaign filter; `None` means every campaign.
    pub fn campaign_filter(&self) -> Option<&'a str> {
        self.args.text("campaign_id")
    }

    /// Campaign id for verbs that act on exactly one campaign.
    pub fn campaign_id(&self) -> Result<&'a str, Error> {
        self.campaign_filter().ok_or_else(|| Error::InvalidCampaignId(self.settings.all_alias.clone()))
    }

    /// A numeric positional that the grammar guarantees.
    pub fn number(&self, name: &'static str) -> Result<f64, Error> {
        self.args.number(name).ok_or_else(|| Error::InvalidCommandFlag {
            flag: name,
            value: self.args.get(name).map(Arg::to_string).unwrap_or_default(),
        })
    }

    pub fn wants_field_list(&self) -> bool {
        self.args.switch("list_fields")
    }

    pub fn join_mode(&self) -> JoinMode {
        if self.settings.strict_join { JoinMode::Strict } else { JoinMode::Lenient }
    }

    /// Requested window. `/time` beats the positional interval, and `/date`
    /// overrides the derived start/end dates.
    pub fn window(&self) -> Result<TimeWindow, Error> {
        let token = ["time_range", "time_interval"]
            .iter()
            .find_map(|name| self.args.text(name))
            .unwrap_or(&self.settings.default_time_interval)
            .to_ascii_lowercase();

        let mut window = TimeWindow::new(token.clone());
        window.param = self.route.aliases.iter().find_map(|alias| self.args.text(alias.name)).map(String::from);

        let bounds = match self.args.text("date_range") {
            Some(range) => Some(
                parse_date_range(range)
                    .ok_or_else(|| Error::InvalidCommandFlag { flag: "date_range", value: range.to_string() })?,
            ),
            None => parse_interval(&token).and_then(|spec| window_bounds(&spec, self.context.reference_date)),
        };
        if let Some((start, end)) = bounds {
            window.start = Some(start);
            window.end = Some(end);
        }
        Ok(window)
    }
}

/// Rename the tracker's `clicks` so it survives a merge with platform clicks.
pub(crate) fn rename_tracker_clicks(records: Vec<Record>) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            if let Some(clicks) = record.remove("clicks") {
                record.insert(TRACKER_CLICKS, clicks);
            }
            record
        })
        .collect()
}

/// Share of platform clicks the tracker never saw, in percent, clamped to
/// `0..=100`. `None` without platform clicks.
pub(crate) fn bot_traffic(record: &Record) -> Option<f64> {
    let clicks = record.number("clicks").filter(|c| *c > 0.0)?;
    let seen = record.number(TRACKER_CLICKS).unwrap_or(0.0);
    let percent = 100.0 * (1.0 - seen / clicks);
    Some((percent.clamp(0.0, 100.0) * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_traffic_is_clamped() {
        let record = Record::new().with("clicks", 200).with(TRACKER_CLICKS, 150);
        assert_eq!(bot_traffic(&record), Some(25.0));

        let more_seen = Record::new().with("clicks", 10).with(TRACKER_CLICKS, 12);
        assert_eq!(bot_traffic(&more_seen), Some(0.0));

        assert_eq!(bot_traffic(&Record::new().with("clicks", 0)), None);
    }

    #[test]
    fn tracker_clicks_are_renamed() {
        let out = rename_tracker_clicks(vec![Record::new().with("id", "w1").with("clicks", 3)]);
        assert_eq!(out[0].number(TRACKER_CLICKS), Some(3.0));
        assert!(!out[0].contains("clicks"));
    }

    #[test]
    fn outcome_emptiness_looks_at_the_body_only() {
        assert!(Outcome::records(vec![]).is_empty());
        assert!(!Outcome::text("Resumed 2 widgets").is_empty());
        assert_eq!(Outcome::field_list(["b".to_string(), "a".to_string(), "a".to_string()]).body, Body::Text("a\nb".into()));
    }
}
