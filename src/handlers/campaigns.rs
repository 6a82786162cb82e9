//! Campaign verbs of the ad networks.

use tracing::info;

use crate::error::{Error, ErrorList};
use crate::platform::TimeWindow;
use crate::reconcile::{JoinMode, merge_tracker_stats};
use crate::record::{CPA_FIELD, MergedRecord, Record, number_value};

use super::{Invocation, Outcome, TRACKER_CLICKS, bot_traffic as bot_traffic_percent, rename_tracker_clicks};

pub(crate) fn list(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let network = inv.network()?;
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(network.campaign_fields()));
    }

    let campaigns = network.list_campaigns()?;
    let records = match inv.campaign_filter() {
        None => campaigns,
        Some(id) => {
            let found: Vec<Record> = campaigns.into_iter().filter(|c| c.id().as_deref() == Some(id)).collect();
            if found.is_empty() {
                return Err(Error::InvalidCampaignId(id.to_string()));
            }
            found
        }
    };
    Ok(Outcome::records(records))
}

pub(crate) fn stats(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let network = inv.network()?;
    let tracker = inv.backends.tracker();
    if inv.wants_field_list() {
        let mut fields = network.campaign_fields();
        fields.extend(tracker.campaign_fields());
        fields.push(CPA_FIELD.to_string());
        return Ok(Outcome::field_list(fields));
    }

    let (merged, errors) = merged_campaign_stats(inv, inv.join_mode())?;
    Ok(Outcome::records(merged.into_iter().map(MergedRecord::into_record).collect()).with_errors(errors))
}

/// Spend per campaign; campaigns that spent nothing are left out.
pub(crate) fn spent(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let network = inv.network()?;
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(["id", "name", "spent"].map(String::from)));
    }

    let window = inv.window()?;
    let stats = checked_campaign_stats(inv, &window)?;
    let records = stats
        .into_iter()
        .filter_map(|row| {
            let spent = MergedRecord::from_record(row.clone()).cost().filter(|s| *s > 0.0)?;
            let mut out = Record::new().with("spent", number_value(spent));
            for key in ["id", "name"] {
                if let Some(value) = row.get(key) {
                    out.insert(key, value.clone());
                }
            }
            Some(out)
        })
        .collect();
    info!(platform = %network.platform(), window = %window.token, "spent computed");
    Ok(Outcome::records(records))
}

/// Platform clicks against tracker clicks, per campaign.
pub(crate) fn bot_traffic(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(["id", "name", "clicks", TRACKER_CLICKS, "bot_traffic"].map(String::from)));
    }

    let (merged, errors) = merged_campaign_stats(inv, inv.join_mode())?;
    let records = merged
        .into_iter()
        .filter_map(|m| {
            let record = m.fields();
            let percent = bot_traffic_percent(record)?;
            let mut out = Record::new().with("bot_traffic", number_value(percent));
            for key in ["id", "name", "clicks", TRACKER_CLICKS] {
                if let Some(value) = record.get(key) {
                    out.insert(key, value.clone());
                }
            }
            Some(out)
        })
        .collect();
    Ok(Outcome::records(records).with_errors(errors))
}

fn merged_campaign_stats(inv: &Invocation<'_>, mode: JoinMode) -> Result<(Vec<MergedRecord>, ErrorList), Error> {
    let window = inv.window()?;
    let stats = checked_campaign_stats(inv, &window)?;
    let tracker = rename_tracker_clicks(inv.backends.tracker().campaign_stats(None, &window)?);

    let reconciled = merge_tracker_stats(stats, &tracker, inv.platform, mode)?;
    info!(
        platform = %inv.platform,
        merged = reconciled.merged.len(),
        unjoinable = reconciled.errors.len(),
        "campaign stats reconciled"
    );
    Ok((reconciled.merged, reconciled.errors))
}

/// Platform stats for the requested campaign(s). An explicit campaign the
/// platform does not know is an error, not an empty result.
fn checked_campaign_stats(inv: &Invocation<'_>, window: &TimeWindow) -> Result<Vec<Record>, Error> {
    let network = inv.network()?;
    let filter = inv.campaign_filter();
    let stats = network.campaign_stats(filter, window)?;
    if let Some(id) = filter {
        if stats.is_empty() && network.find_campaign(id)?.is_none() {
            return Err(Error::InvalidCampaignId(id.to_string()));
        }
    }
    Ok(stats)
}
