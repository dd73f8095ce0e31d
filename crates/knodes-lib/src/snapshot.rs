//! Point-in-time cluster snapshot consumed by the report
//!
//! A snapshot is either fetched live from the API server or loaded from
//! saved `kubectl get nodes -o json` and `kubectl top nodes` output.

use crate::metrics::RawNodeMetrics;
use k8s_openapi::api::core::v1::Node;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse node list: {0}")]
    NodeList(#[from] serde_json::Error),
}

/// Raw nodes plus raw per-node metrics, keyed by node name
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<Node>,
    pub metrics: HashMap<String, RawNodeMetrics>,
}

impl ClusterSnapshot {
    pub fn new(nodes: Vec<Node>, metrics: HashMap<String, RawNodeMetrics>) -> Self {
        Self { nodes, metrics }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn metrics_for(&self, node: &str) -> Option<&RawNodeMetrics> {
        self.metrics.get(node)
    }
}

#[derive(Deserialize)]
struct NodeList {
    #[serde(default)]
    items: Vec<Node>,
}

/// Parse a `kubectl get nodes -o json` document
pub fn parse_node_list(json: &str) -> Result<Vec<Node>, SnapshotError> {
    let list: NodeList = serde_json::from_str(json)?;
    Ok(list.items)
}

/// Parse `kubectl top nodes` output; unparsable lines are skipped
pub fn parse_top_output(text: &str) -> HashMap<String, RawNodeMetrics> {
    text.lines().filter_map(RawNodeMetrics::from_top_line).collect()
}
