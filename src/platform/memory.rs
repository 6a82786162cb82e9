//! In-process backends driven by JSON fixtures.
//!
//! ```json
//! {
//!   "mgid":     { "campaigns": [..], "campaign_stats": [..], "widget_stats": { "<campaign id>": [..] } },
//!   "zeropark": { .. },
//!   "thrive":   { "campaigns": [..], "sources": [..], "campaign_stats": [..], "widget_stats": { "<tracker id>": [..] } }
//! }
//! ```
//!
//! Windows are recorded but not applied: fixture stats are returned as-is for
//! any interval.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Deserialize;
use tracing::debug;

use crate::Platform;
use crate::error::PlatformError;
use crate::record::Record;

use super::{AdNetwork, Backends, TimeWindow, Tracker};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkFixture {
    pub campaigns: Vec<Record>,
    pub campaign_stats: Vec<Record>,
    /// Widget rows keyed by platform campaign id.
    pub widget_stats: BTreeMap<String, Vec<Record>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerFixture {
    pub campaigns: Vec<Record>,
    pub sources: Vec<Record>,
    pub campaign_stats: Vec<Record>,
    /// Widget rows keyed by tracker campaign id. A row may carry a `platform`
    /// field restricting it to one network.
    pub widget_stats: BTreeMap<String, Vec<Record>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixtures {
    pub mgid: Option<NetworkFixture>,
    pub zeropark: Option<NetworkFixture>,
    pub thrive: TrackerFixture,
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse fixtures JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Fixtures {
    pub fn from_json(source: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn into_backends(self) -> Backends {
        let mut backends = Backends::new(Arc::new(MemoryTracker::new(self.thrive)));
        if let Some(mgid) = self.mgid {
            backends = backends.with_network(Arc::new(MemoryNetwork::new(Platform::Mgid, mgid)));
        }
        if let Some(zeropark) = self.zeropark {
            backends = backends.with_network(Arc::new(MemoryNetwork::new(Platform::Zeropark, zeropark)));
        }
        backends
    }
}

/// Fixture-backed ad network. Pauses and resumes are tracked per campaign.
#[derive(Debug)]
pub struct MemoryNetwork {
    platform: Platform,
    fixture: NetworkFixture,
    paused: RwLock<HashMap<String, BTreeSet<String>>>,
    last_window: RwLock<Option<TimeWindow>>,
}

impl MemoryNetwork {
    pub fn new(platform: Platform, fixture: NetworkFixture) -> Self {
        MemoryNetwork { platform, fixture, paused: RwLock::default(), last_window: RwLock::default() }
    }

    /// Widgets currently paused in `campaign_id`, sorted.
    pub fn paused_widgets(&self, campaign_id: &str) -> Vec<String> {
        let paused = self.paused.read().unwrap_or_else(PoisonError::into_inner);
        paused.get(campaign_id).map(|ids| ids.iter().cloned().collect()).unwrap_or_default()
    }

    /// Window passed to the most recent stats call.
    pub fn last_window(&self) -> Option<TimeWindow> {
        self.last_window.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record_window(&self, window: &TimeWindow) {
        *self.last_window.write().unwrap_or_else(PoisonError::into_inner) = Some(window.clone());
    }

    fn not_found(&self, campaign_id: &str) -> PlatformError {
        PlatformError::Api { platform: self.platform, status: 404, message: format!("campaign {campaign_id} not found") }
    }
}

impl AdNetwork for MemoryNetwork {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn list_campaigns(&self) -> Result<Vec<Record>, PlatformError> {
        Ok(self.fixture.campaigns.clone())
    }

    fn campaign_stats(&self, campaign_id: Option<&str>, window: &TimeWindow) -> Result<Vec<Record>, PlatformError> {
        self.record_window(window);
        let rows = self.fixture.campaign_stats.iter();
        Ok(match campaign_id {
            Some(id) => rows.filter(|r| r.id().as_deref() == Some(id)).cloned().collect(),
            None => rows.cloned().collect(),
        })
    }

    fn widget_stats(&self, campaign_id: &str, window: &TimeWindow) -> Result<Vec<Record>, PlatformError> {
        self.record_window(window);
        let rows = self.fixture.widget_stats.get(campaign_id).ok_or_else(|| self.not_found(campaign_id))?;
        let paused = self.paused_widgets(campaign_id);
        Ok(rows
            .iter()
            .map(|row| {
                let status = if row.id().is_some_and(|id| paused.contains(&id)) { "paused" } else { "active" };
                row.clone().with("status", status)
            })
            .collect())
    }

    fn pause_widgets(&self, campaign_id: &str, widget_ids: &[String]) -> Result<(), PlatformError> {
        if !self.fixture.widget_stats.contains_key(campaign_id) {
            return Err(self.not_found(campaign_id));
        }
        let mut paused = self.paused.write().unwrap_or_else(PoisonError::into_inner);
        paused.entry(campaign_id.to_string()).or_default().extend(widget_ids.iter().cloned());
        debug!(platform = %self.platform, campaign_id, count = widget_ids.len(), "widgets paused");
        Ok(())
    }

    fn resume_all_widgets(&self, campaign_id: &str) -> Result<usize, PlatformError> {
        if !self.fixture.widget_stats.contains_key(campaign_id) {
            return Err(self.not_found(campaign_id));
        }
        let mut paused = self.paused.write().unwrap_or_else(PoisonError::into_inner);
        Ok(paused.remove(campaign_id).map(|ids| ids.len()).unwrap_or(0))
    }

    fn campaign_fields(&self) -> Vec<String> {
        field_names(self.fixture.campaigns.iter().chain(&self.fixture.campaign_stats))
    }

    fn widget_fields(&self) -> Vec<String> {
        let mut fields = field_names(self.fixture.widget_stats.values().flatten());
        if !fields.iter().any(|f| f == "status") {
            fields.push("status".to_string());
            fields.sort();
        }
        fields
    }
}

/// Fixture-backed tracker with an append-only campaign-name cache.
#[derive(Debug)]
pub struct MemoryTracker {
    fixture: TrackerFixture,
    names: RwLock<HashMap<String, String>>,
}

impl MemoryTracker {
    pub fn new(fixture: TrackerFixture) -> Self {
        MemoryTracker { fixture, names: RwLock::default() }
    }

    pub fn cached_names(&self) -> usize {
        self.names.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn cache(&self, campaigns: &[Record]) {
        let mut names = self.names.write().unwrap_or_else(PoisonError::into_inner);
        for campaign in campaigns {
            if let (Some(id), Some(name)) = (campaign.id(), campaign.name()) {
                names.insert(id, name.to_string());
            }
        }
    }
}

impl Tracker for MemoryTracker {
    fn list_campaigns(&self) -> Result<Vec<Record>, PlatformError> {
        let campaigns = self.fixture.campaigns.clone();
        self.cache(&campaigns);
        Ok(campaigns)
    }

    fn list_sources(&self, _window: &TimeWindow) -> Result<Vec<Record>, PlatformError> {
        Ok(self.fixture.sources.clone())
    }

    fn campaign_stats(&self, campaign_id: Option<&str>, _window: &TimeWindow) -> Result<Vec<Record>, PlatformError> {
        let rows = self.fixture.campaign_stats.iter();
        Ok(match campaign_id {
            Some(id) => rows.filter(|r| r.id().as_deref() == Some(id)).cloned().collect(),
            None => rows.cloned().collect(),
        })
    }

    fn widget_stats(
        &self,
        tracker_id: &str,
        platform: Platform,
        _window: &TimeWindow,
    ) -> Result<Vec<Record>, PlatformError> {
        let rows = self.fixture.widget_stats.get(tracker_id).map(Vec::as_slice).unwrap_or_default();
        Ok(rows
            .iter()
            .filter(|row| row.text("platform").is_none_or(|p| p.eq_ignore_ascii_case(platform.name())))
            .map(|row| {
                let mut row = row.clone();
                row.remove("platform");
                row
            })
            .collect())
    }

    fn campaign_name(&self, tracker_id: &str) -> Result<Option<String>, PlatformError> {
        if let Some(name) = self.names.read().unwrap_or_else(PoisonError::into_inner).get(tracker_id) {
            return Ok(Some(name.clone()));
        }
        self.list_campaigns()?;
        Ok(self.names.read().unwrap_or_else(PoisonError::into_inner).get(tracker_id).cloned())
    }

    fn campaign_fields(&self) -> Vec<String> {
        field_names(self.fixture.campaigns.iter().chain(&self.fixture.campaign_stats))
    }

    fn source_fields(&self) -> Vec<String> {
        field_names(self.fixture.sources.iter())
    }
}

fn field_names<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<String> {
    let names: BTreeSet<&str> = records.flat_map(Record::keys).collect();
    names.into_iter().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn network() -> MemoryNetwork {
        let fixture: NetworkFixture = serde_json::from_value(json!({
            "campaigns": [{"id": 1, "name": "10013 Summer"}],
            "widget_stats": {"1": [{"id": "w1", "clicks": 10}, {"id": "w2", "clicks": 3}]}
        }))
        .unwrap();
        MemoryNetwork::new(Platform::Mgid, fixture)
    }

    #[test]
    fn pause_and_resume_round_trip() {
        let network = network();
        network.pause_widgets("1", &["w2".to_string()]).unwrap();

        let rows = network.widget_stats("1", &TimeWindow::new("7d")).unwrap();
        assert_eq!(rows[1].text("status").as_deref(), Some("paused"));
        assert_eq!(network.paused_widgets("1"), ["w2"]);

        assert_eq!(network.resume_all_widgets("1").unwrap(), 1);
        assert!(network.paused_widgets("1").is_empty());
    }

    #[test]
    fn unknown_campaigns_are_api_errors() {
        let network = network();
        let err = network.pause_widgets("404", &[]).unwrap_err();
        assert!(matches!(err, PlatformError::Api { status: 404, .. }));
    }

    #[test]
    fn tracker_name_lookup_fills_the_cache() {
        let tracker = MemoryTracker::new(TrackerFixture {
            campaigns: vec![Record::new().with("id", "10013").with("name", "Summer")],
            ..TrackerFixture::default()
        });

        assert_eq!(tracker.cached_names(), 0);
        assert_eq!(tracker.campaign_name("10013").unwrap().as_deref(), Some("Summer"));
        assert_eq!(tracker.cached_names(), 1);
        assert_eq!(tracker.campaign_name("99").unwrap(), None);
    }

    #[test]
    fn fixtures_build_only_configured_networks() {
        let fixtures = Fixtures::from_json(r#"{"zeropark": {}, "thrive": {}}"#).unwrap();
        let backends = fixtures.into_backends();
        assert_eq!(backends.platforms(), [Platform::Zeropark]);
        assert!(backends.network(Platform::Mgid).is_err());
    }
}
