//! Kubernetes API client for node and metrics snapshots

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use knodes_lib::metrics::{RawNodeMetrics, UNKNOWN_TOKEN};
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::GroupVersionKind;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Client for the cluster API server
pub struct ClusterClient {
    client: kube::Client,
}

impl ClusterClient {
    /// Connect using an explicit kubeconfig and/or context, or the inferred default
    pub async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> Result<Self> {
        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };

        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .context("Invalid kubeconfig")?
            }
            None if context.is_some() => kube::Config::from_kubeconfig(&options)
                .await
                .context("Failed to load kubeconfig context")?,
            None => kube::Config::infer()
                .await
                .context("Failed to infer cluster configuration")?,
        };

        let client = kube::Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self { client })
    }

    /// List all nodes
    pub async fn nodes(&self) -> Result<Vec<Node>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .context("Failed to list nodes")?;
        Ok(list.items)
    }

    /// Current usage per node from `metrics.k8s.io`, in `kubectl top` form
    pub async fn node_metrics(&self, nodes: &[Node]) -> Result<HashMap<String, RawNodeMetrics>> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "NodeMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "nodes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let list = api
            .list(&ListParams::default())
            .await
            .context("Failed to query metrics.k8s.io")?;

        let allocatable: HashMap<&str, &BTreeMap<String, Quantity>> = nodes
            .iter()
            .filter_map(|n| {
                let name = n.metadata.name.as_deref()?;
                let allocatable = n.status.as_ref()?.allocatable.as_ref()?;
                Some((name, allocatable))
            })
            .collect();

        let metrics = list
            .items
            .iter()
            .filter_map(|item| {
                let name = item.metadata.name.clone()?;
                let usage = item.data.get("usage")?;
                let quantity = |key: &str| usage.get(key).and_then(|v| v.as_str()).unwrap_or(UNKNOWN_TOKEN);
                let node_allocatable = |key: &str| {
                    allocatable
                        .get(name.as_str())
                        .and_then(|a| a.get(key))
                        .map(|q| q.0.as_str())
                };

                let raw = RawNodeMetrics::from_usage(
                    quantity("cpu"),
                    quantity("memory"),
                    node_allocatable("cpu"),
                    node_allocatable("memory"),
                );
                Some((name, raw))
            })
            .collect();

        Ok(metrics)
    }
}
