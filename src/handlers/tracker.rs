//! Verbs addressed to the tracker itself.

use crate::error::Error;
use crate::record::{CPA_FIELD, MergedRecord, Record};

use super::{Invocation, Outcome};

pub(crate) fn list(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let tracker = inv.backends.tracker();
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(tracker.campaign_fields()));
    }

    let campaigns = tracker.list_campaigns()?;
    let records: Vec<Record> = match inv.campaign_filter() {
        None => campaigns,
        Some(id) => campaigns.into_iter().filter(|c| c.id().as_deref() == Some(id)).collect(),
    };
    if let (Some(id), true) = (inv.campaign_filter(), records.is_empty()) {
        return Err(Error::InvalidCampaignId(id.to_string()));
    }
    Ok(Outcome::records(records))
}

pub(crate) fn sources(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let tracker = inv.backends.tracker();
    if inv.wants_field_list() {
        return Ok(Outcome::field_list(tracker.source_fields()));
    }
    let window = inv.window()?;
    Ok(Outcome::records(tracker.list_sources(&window)?))
}

/// Tracker stats per campaign, named from the campaign cache.
pub(crate) fn stats(inv: &Invocation<'_>) -> Result<Outcome, Error> {
    let tracker = inv.backends.tracker();
    if inv.wants_field_list() {
        let mut fields = tracker.campaign_fields();
        fields.push(CPA_FIELD.to_string());
        return Ok(Outcome::field_list(fields));
    }
    let window = inv.window()?;
    let rows = tracker.campaign_stats(inv.campaign_filter(), &window)?;

    let mut records = Vec::with_capacity(rows.len());
    for mut row in rows {
        if row.name().is_none() {
            if let Some(name) = row.id().map(|id| tracker.campaign_name(&id)).transpose()?.flatten() {
                row.insert("name", name);
            }
        }
        records.push(MergedRecord::from_record(row).into_record());
    }
    Ok(Outcome::records(records))
}
