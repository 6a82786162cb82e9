//! Engine run metrics.
//!
//! Timings are collected for every message and surfaced only by
//! `Engine::handle_message_verbose` and the CLI report.

use std::time::Duration;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunMetrics {
    /// Total elapsed time for one message, formatting included.
    pub total: Duration,
    /// Head match, grammar selection and flag scan.
    pub matching: Duration,
    /// Argument resolution, dispatch lookup and alias expansion.
    pub resolve: Duration,
    /// Handler execution, including backend calls and reconciliation.
    pub execute: Duration,
    /// Projection, rendering and chunking.
    pub format: Duration,
}

impl RunMetrics {
    /// Time not attributed to any phase.
    pub fn overhead(&self) -> Duration {
        self.total.saturating_sub(self.matching + self.resolve + self.execute + self.format)
    }
}
