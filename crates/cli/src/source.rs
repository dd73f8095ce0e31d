//! Where the report's snapshot comes from: the live cluster or saved files

use crate::client::ClusterClient;
use anyhow::{Context, Result};
use knodes_lib::snapshot::{self, ClusterSnapshot};
use knodes_lib::ReportLogger;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum SnapshotSource {
    /// Query the API server and metrics.k8s.io
    Cluster {
        kubeconfig: Option<PathBuf>,
        context: Option<String>,
    },
    /// Saved `kubectl get nodes -o json` and optional `kubectl top nodes` output
    Files { nodes: PathBuf, top: Option<PathBuf> },
}

impl SnapshotSource {
    /// Short label used in log events
    pub fn describe(&self) -> String {
        match self {
            SnapshotSource::Cluster { context, .. } => match context {
                Some(context) => format!("context:{context}"),
                None => "context:default".to_string(),
            },
            SnapshotSource::Files { nodes, .. } => format!("file:{}", nodes.display()),
        }
    }

    /// Load a snapshot.
    ///
    /// Cluster fetch failures are logged and yield empty data so the report
    /// still prints. Unreadable or malformed files are errors.
    pub async fn load(&self, logger: &ReportLogger) -> Result<ClusterSnapshot> {
        match self {
            SnapshotSource::Cluster {
                kubeconfig,
                context,
            } => Ok(fetch_cluster(kubeconfig.as_deref(), context.as_deref(), logger).await),
            SnapshotSource::Files { nodes, top } => load_files(nodes, top.as_deref(), logger),
        }
    }
}

async fn fetch_cluster(
    kubeconfig: Option<&Path>,
    context: Option<&str>,
    logger: &ReportLogger,
) -> ClusterSnapshot {
    let client = match ClusterClient::connect(kubeconfig, context).await {
        Ok(client) => client,
        Err(e) => {
            logger.log_fetch_failed("connect", &format!("{e:#}"));
            return ClusterSnapshot::default();
        }
    };

    let nodes = match client.nodes().await {
        Ok(nodes) => {
            logger.log_nodes_fetched(nodes.len());
            nodes
        }
        Err(e) => {
            logger.log_fetch_failed("nodes", &format!("{e:#}"));
            return ClusterSnapshot::default();
        }
    };

    let metrics = match client.node_metrics(&nodes).await {
        Ok(metrics) => {
            logger.log_metrics_fetched(metrics.len());
            metrics
        }
        Err(e) => {
            logger.log_fetch_failed("metrics", &format!("{e:#}"));
            HashMap::new()
        }
    };

    ClusterSnapshot::new(nodes, metrics)
}

fn load_files(
    nodes_path: &Path,
    top_path: Option<&Path>,
    logger: &ReportLogger,
) -> Result<ClusterSnapshot> {
    let json = fs::read_to_string(nodes_path)
        .with_context(|| format!("Failed to read {}", nodes_path.display()))?;
    let nodes = snapshot::parse_node_list(&json)
        .with_context(|| format!("Invalid node list in {}", nodes_path.display()))?;
    logger.log_nodes_fetched(nodes.len());

    let metrics = match top_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let metrics = snapshot::parse_top_output(&text);
            logger.log_metrics_fetched(metrics.len());
            metrics
        }
        None => HashMap::new(),
    };

    Ok(ClusterSnapshot::new(nodes, metrics))
}
