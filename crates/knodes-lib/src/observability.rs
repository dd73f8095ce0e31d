//! Structured logging for report runs
//!
//! Events go through `tracing`; the binary installs a subscriber writing to
//! stderr so they never mix with the report on stdout.

use crate::grouping::Topology;
use tracing::{debug, info, warn};

/// Structured logger for fetch and report events
#[derive(Clone)]
pub struct ReportLogger {
    source: String,
}

impl ReportLogger {
    /// `source` names where the snapshot comes from (kube context or file)
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Log a successful node listing
    pub fn log_nodes_fetched(&self, count: usize) {
        info!(
            event = "nodes_fetched",
            source = %self.source,
            count = count,
            "Fetched cluster nodes"
        );
    }

    /// Log successful metrics retrieval
    pub fn log_metrics_fetched(&self, count: usize) {
        info!(
            event = "metrics_fetched",
            source = %self.source,
            count = count,
            "Fetched node metrics"
        );
    }

    /// Log a failed fetch that the report recovers from
    pub fn log_fetch_failed(&self, what: &str, error: &dyn std::fmt::Display) {
        warn!(
            event = "fetch_failed",
            source = %self.source,
            what = %what,
            error = %error,
            "Fetch failed, continuing with empty data"
        );
    }

    /// Log report generation
    pub fn log_report(&self, records: usize, topology: Topology, elapsed_ms: u128) {
        debug!(
            event = "report_rendered",
            source = %self.source,
            records = records,
            topology = %topology,
            elapsed_ms = elapsed_ms as u64,
            "Rendered node report"
        );
    }
}
