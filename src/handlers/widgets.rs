//! Widget verbs.
//!
//! Every verb starts from the same table: the campaign's widget rows on the
//! platform, joined by widget id with the tracker rows of the tracker
//! campaign named in the platform campaign's name.
//!
//! ```text
//! campaign {id: 1023198, name: "10013 Summer"}
//!   ├─ platform.widget_stats(1023198)          [{id: w1, clicks, spent}, ...]
//!   └─ tracker.widget_stats(10013, platform)   [{id: w1, thrive_clicks, conv, rev}, ...]
//!        merge_by_key(id, Outer), platform ids only, + cpa
//! ```

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::error::{Error, ErrorEntry, ErrorList};
use crate::platform::AdNetwork;
use crate::reconcile::{JoinMode, KeyMerge, MISSING_TRACKER_ID, join_key, merge_by_key};
use crate::record::{CPA_FIELD, MergedRecord, Record, number_value};

use super::{Invocation, Outcome, TRACKER_CLICKS, bot_traffic, rename_tracker_clicks};

/// Widgets of one campaign, merged with tracker data.
struct WidgetTable {
    campaign_id: String,
    rows: Vec<MergedRecord>,
    errors: ErrorList,
}

fn widget_table(inv: &Invocation<'_>) -> Result<WidgetTable, Error> {
    let network = inv.network()?;
    let campaign_id = inv.campaign_id()?;
    let campaign = network.find_campaign(campaign_id)?.ok_or_else(|| Error::InvalidCampaignId(campaign_id.to_string()))?;
    let window = inv.window()?;
    let platform_rows = network.widget_stats(campaign_id, &window)?;

    let mut errors = ErrorList::new();
    let name = campaign.name().unwrap_or_default();
    let merged = match join_key(name) {
        Some(tracker_id) => {
            let tracker_rows =
                rename_tracker_clicks(inv.backends.tracker().widget_stats(tracker_id, inv.platform, &window)?);
            let platform_ids: Vec<String> = platform_rows.iter().filter_map(Record::id).collect();
            merge_by_key(&platform_rows, &tracker_rows, "id", KeyMerge::Outer)
                .into_iter()
                .filter(|row| row.id().is_some_and(|id| platform_ids.contains(&id)))
                .collect()
        }
        None if inv.join_mode() == JoinMode::Strict => {
            return Err(Error::UnjoinableRecord {
                platform: inv.platform,
                id: campaign_id.to_string(),
                name: name.to_string(),
            });
        }
        None => {
            warn!(
                platform = %inv.platform,
                command = %inv.command,
                campaign_id,
                name,
                "campaign has no tracker id, platform data only"
            );
            errors.push(
                ErrorEntry::new(MISSING_TRACKER_ID).with_id(campaign_id).with_name(name).with_platform(inv.platform),
            );
            platform_rows
        }
    };

    Ok(WidgetTable {
        campaign_id: campaign_id.to_string(),
        rows: merged.into_iter().map(MergedRecord::from_record).collect(),
        errors,
    })
}

fn field_list(network: &dyn AdNetwork, extra: &[&str]) -> Outcome {
    let mut fields = network.widget_fields();
    fields.extend([CPA_FIELD, TRACKER_CLICKS, "conv", "rev"].iter().chain(extra).map(|s| s.to_string()));
    Outcome::field_list(fields)
}

fn respond(rows: Vec<MergedRecord>, errors: ErrorList) -> Outcome {
    Outcome::records(rows.into_iter().map(MergedRecord::into_record).collect()).with_errors(errors)
}

/// Best widgets by conversions, then by lowest CPA.
pub(crate) fn top(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &[]));
    }
    let limit = inv.args.integer("filter_limit").unwrap_or(inv.settings.default_filter_number).max(0) as usize;
    let WidgetTable { mut rows, errors, .. } = widget_table(inv)?;

    rows.retain(|w| w.conversions() > 0.0);
    rows.sort_by(|a, b| {
        b.conversions()
            .partial_cmp(&a.conversions())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cpa().unwrap_or(0.0).partial_cmp(&b.cpa().unwrap_or(0.0)).unwrap_or(Ordering::Equal))
    });
    rows.truncate(limit);
    Ok(respond(rows, errors))
}

/// Every widget, or a single one when `widget_id` is given.
pub(crate) fn stats(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &[]));
    }
    let WidgetTable { mut rows, errors, .. } = widget_table(inv)?;

    if let Some(widget_id) = inv.args.text("widget_id") {
        rows.retain(|w| w.id().as_deref() == Some(widget_id));
        if rows.is_empty() {
            return Err(Error::NoSuchWidget(widget_id.to_string()));
        }
    }
    Ok(respond(rows, errors))
}

/// Widgets whose CPA exceeds the threshold. A widget without conversions
/// qualifies once its spend alone exceeds the threshold.
pub(crate) fn high_cpa(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &[]));
    }
    let threshold = inv.number("threshold")?;
    let WidgetTable { mut rows, errors, .. } = widget_table(inv)?;

    rows.retain(|w| {
        if w.conversions() > 0.0 {
            w.cpa().is_some_and(|cpa| cpa > threshold)
        } else {
            w.cost().is_some_and(|cost| cost > threshold)
        }
    });
    Ok(respond(rows, errors))
}

/// Converting widgets whose CPA is under the threshold.
pub(crate) fn low_cpa(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &[]));
    }
    let threshold = inv.number("threshold")?;
    let WidgetTable { mut rows, errors, .. } = widget_table(inv)?;

    rows.retain(|w| w.conversions() > 0.0 && w.cpa().is_some_and(|cpa| cpa < threshold));
    Ok(respond(rows, errors))
}

/// Pause active widgets that spent less than the threshold.
pub(crate) fn kill_longtail(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &["action"]));
    }
    let threshold = inv.number("threshold")?;
    let table = widget_table(inv)?;

    let targets: Vec<MergedRecord> = table
        .rows
        .into_iter()
        .filter(is_active)
        .filter(|w| w.cost().unwrap_or(0.0) < threshold)
        .collect();
    pause(inv, &table.campaign_id, targets, table.errors)
}

/// Pause active widgets whose bot-traffic share reaches the threshold.
pub(crate) fn kill_bot(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(field_list(inv.network()?, &["action", "bot_traffic"]));
    }
    let threshold = inv.number("threshold")?;
    let table = widget_table(inv)?;

    let targets: Vec<MergedRecord> = table
        .rows
        .into_iter()
        .filter(is_active)
        .filter_map(|w| {
            let percent = bot_traffic(w.fields())?;
            let mut record = w.fields().clone();
            record.insert("bot_traffic", number_value(percent));
            (percent >= threshold).then(|| MergedRecord::from_record(record))
        })
        .collect();
    pause(inv, &table.campaign_id, targets, table.errors)
}

pub(crate) fn turn_on_all(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let network = inv.network()?;
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(Vec::new()));
    }
    let campaign_id = inv.campaign_id()?;
    if network.find_campaign(campaign_id)?.is_none() {
        return Err(Error::InvalidCampaignId(campaign_id.to_string()));
    }

    let resumed = network.resume_all_widgets(campaign_id)?;
    info!(platform = %inv.platform, campaign_id, resumed, "widgets resumed");
    Ok(Outcome::text(format!("Resumed {resumed} widgets in campaign {campaign_id}")))
}

fn is_active(widget: &MergedRecord) -> bool {
    widget.fields().text("status").is_none_or(|s| !s.eq_ignore_ascii_case("paused"))
}

fn pause(inv: &Invocation<'_>, campaign_id: &str, targets: Vec<MergedRecord>, errors: ErrorList) -> Result<Outcome, Error> {
    let ids: Vec<String> = targets.iter().filter_map(MergedRecord::id).collect();
    if !ids.is_empty() {
        inv.network()?.pause_widgets(campaign_id, &ids)?;
    }
    info!(platform = %inv.platform, campaign_id, paused = ids.len(), "widgets paused");

    let rows = targets
        .into_iter()
        .map(|w| {
            let mut record = w.into_record();
            record.insert("action", "paused");
            record.insert("status", "paused");
            record
        })
        .collect();
    Ok(Outcome::records(rows).with_errors(errors))
}
