//! Backend boundary.
//!
//! Ad networks (MGID, Zeropark) and the tracker (Thrive) are reached through
//! the [`AdNetwork`] and [`Tracker`] traits. Real HTTP clients live outside
//! this crate; `memory.rs` provides an in-process implementation driven by
//! JSON fixtures.
//!
//! All methods take `&self`: clients are shared between concurrent commands,
//! so any cache they keep needs interior locking.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::Platform;
use crate::error::PlatformError;
use crate::record::Record;

pub mod memory;

/// The time window a command asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval token as typed, e.g. `7d` or `today`.
    pub token: String,
    /// Platform-specific form of the token (`lastSeven`, `LAST_7_DAYS`, ...).
    pub param: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimeWindow {
    pub fn new(token: impl Into<String>) -> Self {
        TimeWindow { token: token.into(), param: None, start: None, end: None }
    }
}

pub trait AdNetwork: Send + Sync {
    fn platform(&self) -> Platform;

    fn list_campaigns(&self) -> Result<Vec<Record>, PlatformError>;

    /// Campaign by platform id.
    fn find_campaign(&self, campaign_id: &str) -> Result<Option<Record>, PlatformError> {
        Ok(self.list_campaigns()?.into_iter().find(|c| c.id().as_deref() == Some(campaign_id)))
    }

    /// Per-campaign stats; `None` means every campaign.
    fn campaign_stats(&self, campaign_id: Option<&str>, window: &TimeWindow) -> Result<Vec<Record>, PlatformError>;

    /// Per-widget (traffic source) stats of one campaign.
    fn widget_stats(&self, campaign_id: &str, window: &TimeWindow) -> Result<Vec<Record>, PlatformError>;

    fn pause_widgets(&self, campaign_id: &str, widget_ids: &[String]) -> Result<(), PlatformError>;

    /// Resume every paused widget of a campaign; returns how many were resumed.
    fn resume_all_widgets(&self, campaign_id: &str) -> Result<usize, PlatformError>;

    /// Field names a campaign record can carry.
    fn campaign_fields(&self) -> Vec<String>;

    fn widget_fields(&self) -> Vec<String>;
}

pub trait Tracker: Send + Sync {
    fn list_campaigns(&self) -> Result<Vec<Record>, PlatformError>;

    fn list_sources(&self, window: &TimeWindow) -> Result<Vec<Record>, PlatformError>;

    fn campaign_stats(&self, campaign_id: Option<&str>, window: &TimeWindow) -> Result<Vec<Record>, PlatformError>;

    /// Stats of the widgets a platform sent to one tracker campaign, keyed by
    /// the platform's widget id.
    fn widget_stats(
        &self,
        tracker_id: &str,
        platform: Platform,
        window: &TimeWindow,
    ) -> Result<Vec<Record>, PlatformError>;

    /// Tracker campaign name, served from the campaign cache when possible.
    fn campaign_name(&self, tracker_id: &str) -> Result<Option<String>, PlatformError>;

    fn campaign_fields(&self) -> Vec<String>;

    fn source_fields(&self) -> Vec<String>;
}

/// The set of clients one engine talks to.
#[derive(Clone)]
pub struct Backends {
    networks: HashMap<Platform, Arc<dyn AdNetwork>>,
    tracker: Arc<dyn Tracker>,
}

impl Backends {
    pub fn new(tracker: Arc<dyn Tracker>) -> Self {
        Backends { networks: HashMap::new(), tracker }
    }

    /// Register a network under the platform it reports.
    pub fn with_network(mut self, network: Arc<dyn AdNetwork>) -> Self {
        self.networks.insert(network.platform(), network);
        self
    }

    pub fn network(&self, platform: Platform) -> Result<&dyn AdNetwork, PlatformError> {
        self.networks.get(&platform).map(|n| n.as_ref()).ok_or(PlatformError::NotConfigured { platform })
    }

    pub fn tracker(&self) -> &dyn Tracker {
        self.tracker.as_ref()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.networks.keys().copied().collect();
        platforms.sort();
        platforms
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").field("networks", &self.platforms()).finish_non_exhaustive()
    }
}
