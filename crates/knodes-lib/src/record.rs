//! Flattening of raw nodes into report records

use crate::classifier::{self, NodeView};
use crate::metrics::{self, RawNodeMetrics};
use crate::models::{GroupKey, GroupKeys, NodeRecord};
use crate::snapshot::ClusterSnapshot;
use k8s_openapi::api::core::v1::{Node, Taint};
use std::collections::BTreeMap;

/// Placeholder for a grouping label the node does not carry
pub const MISSING_VALUE: &str = "N/A";

/// Conditions reported next to the base status when true, in display order
pub const PRESSURE_CONDITIONS: [&str; 4] = [
    "DiskPressure",
    "MemoryPressure",
    "PIDPressure",
    "NetworkUnavailable",
];

/// Label keys the secondary group keys are projected from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySelection {
    pub labels: Vec<String>,
    pub tags: Vec<String>,
}

/// Build one record per named node in the snapshot
pub fn build_records(snapshot: &ClusterSnapshot, selection: &KeySelection) -> Vec<NodeRecord> {
    let unknown = RawNodeMetrics::unknown();

    snapshot
        .nodes
        .iter()
        .filter_map(|node| {
            let name = node.metadata.name.as_deref()?;
            let raw = snapshot.metrics_for(name).unwrap_or(&unknown);
            Some(build_record(node, raw, selection))
        })
        .collect()
}

/// Combine classifier output, normalized metrics and node status
pub fn build_record(node: &Node, raw: &RawNodeMetrics, selection: &KeySelection) -> NodeRecord {
    let view = NodeView::from_node(node);
    let classification = classifier::classify(&view);
    let instance_type = classifier::instance_type(&view, &classification);

    let mem_capacity = resource(node, "memory").unwrap_or(metrics::UNKNOWN_TOKEN);
    let normalized = metrics::normalize(raw, mem_capacity);

    let labels = view.labels.clone();
    let group_keys = GroupKeys {
        labels: group_key(&labels, &selection.labels),
        tags: group_key(&labels, &selection.tags),
    };

    NodeRecord {
        name: view.name.to_string(),
        category: classification.category,
        pool: classification.pool,
        instance_type,
        status: node_status(node),
        taints: node_taints(node),
        cpu_capacity: resource(node, "cpu").unwrap_or(MISSING_VALUE).to_string(),
        cpu_usage: normalized.cpu_usage,
        cpu_percent: normalized.cpu_percent,
        mem_percent: normalized.mem_percent,
        mem_capacity_gb: normalized.mem_capacity_gb,
        mem_usage_gb: normalized.mem_usage_gb,
        labels,
        group_keys,
    }
}

/// Capacity of a resource, falling back to allocatable
fn resource<'a>(node: &'a Node, name: &str) -> Option<&'a str> {
    let status = node.status.as_ref()?;
    status
        .capacity
        .as_ref()
        .and_then(|c| c.get(name))
        .or_else(|| status.allocatable.as_ref().and_then(|a| a.get(name)))
        .map(|q| q.0.as_str())
}

/// Ready state plus any active pressure conditions, e.g. `"Ready, DiskPressure"`
pub fn node_status(node: &Node) -> String {
    let conditions = node
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    let is_true = |kind: &str| {
        conditions
            .iter()
            .any(|c| c.type_ == kind && c.status == "True")
    };

    let base = match conditions.iter().find(|c| c.type_ == "Ready") {
        Some(ready) if ready.status == "True" => "Ready".to_string(),
        Some(ready) => ready
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "NotReady".to_string()),
        None => "Unknown".to_string(),
    };

    let mut parts = vec![base];
    parts.extend(
        PRESSURE_CONDITIONS
            .iter()
            .filter(|kind| is_true(**kind))
            .map(|kind| kind.to_string()),
    );
    parts.join(", ")
}

/// Taints in source order, each as `key[=value][:effect]`
pub fn node_taints(node: &Node) -> Vec<String> {
    node.spec
        .as_ref()
        .and_then(|s| s.taints.as_deref())
        .unwrap_or_default()
        .iter()
        .map(format_taint)
        .collect()
}

pub fn format_taint(taint: &Taint) -> String {
    let mut text = taint.key.clone();
    if let Some(value) = taint.value.as_deref().filter(|v| !v.is_empty()) {
        text.push('=');
        text.push_str(value);
    }
    if !taint.effect.is_empty() {
        text.push(':');
        text.push_str(&taint.effect);
    }
    text
}

/// Project the requested label keys into a group key
pub fn group_key(labels: &BTreeMap<String, String>, keys: &[String]) -> Option<GroupKey> {
    if keys.is_empty() {
        return None;
    }

    let values: Vec<String> = keys
        .iter()
        .map(|k| {
            labels
                .get(k)
                .cloned()
                .unwrap_or_else(|| MISSING_VALUE.to_string())
        })
        .collect();
    let display = keys
        .iter()
        .zip(&values)
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ");

    Some(GroupKey { display, values })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::classifier::KARPENTER_NODEPOOL_LABEL;
    use crate::models::Category;
    use std::collections::HashMap;

    #[test]
    fn test_build_record_fields() {
        let node = node(
            "ip-10-0-0-1",
            &[
                (KARPENTER_NODEPOOL_LABEL, "general"),
                ("node.kubernetes.io/instance-type", "m5.large"),
                ("team", "payments"),
            ],
        );
        let raw = RawNodeMetrics::new("1200m", "30%", "8192Mi", "50%");
        let selection = KeySelection {
            labels: vec!["team".to_string()],
            tags: vec!["cost-center".to_string()],
        };

        let record = build_record(&node, &raw, &selection);

        assert_eq!(record.name, "ip-10-0-0-1");
        assert_eq!(record.category, Category::Karpenter);
        assert_eq!(record.pool, "general");
        assert_eq!(record.instance_type, "m5.large");
        assert_eq!(record.status, "Ready");
        assert!(record.taints.is_empty());
        assert_eq!(record.cpu_capacity, "4");
        assert_eq!(record.cpu_usage, "1200m");
        assert_eq!(record.cpu_percent, 30);
        assert_eq!(record.mem_percent, 50);
        assert!((record.mem_usage_gb - 8.0).abs() < 1e-9);
        assert!((record.mem_capacity_gb - 16.0).abs() < 1e-9);

        let labels = record.group_keys.labels.unwrap();
        assert_eq!(labels.display, "team=payments");
        let tags = record.group_keys.tags.unwrap();
        assert_eq!(tags.values, vec![MISSING_VALUE.to_string()]);
        assert_eq!(tags.display, "cost-center=N/A");
    }

    #[test]
    fn test_unknown_metrics_still_produce_record() {
        let node = node("ip-1", &[]);
        let record = build_record(&node, &RawNodeMetrics::unknown(), &KeySelection::default());

        assert_eq!(record.cpu_usage, "0m");
        assert_eq!(record.cpu_percent, 0);
        assert_eq!(record.mem_usage_gb, 0.0);
        assert_eq!(record.mem_percent, 0);
        assert_eq!(record.group_keys, GroupKeys::default());
    }

    #[test]
    fn test_build_records_joins_metrics_by_name() {
        let mut metrics = HashMap::new();
        metrics.insert(
            "ip-1".to_string(),
            RawNodeMetrics::new("500m", "12%", "1024Mi", "7%"),
        );
        let snapshot = ClusterSnapshot::new(vec![node("ip-1", &[]), node("ip-2", &[])], metrics);

        let records = build_records(&snapshot, &KeySelection::default());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cpu_percent, 12);
        assert_eq!(records[1].cpu_usage, "0m");
    }

    #[test]
    fn test_status_not_ready_with_reason_and_pressure() {
        let node = with_conditions(
            node("ip-1", &[]),
            vec![
                condition("Ready", "False", Some("KubeletNotReady")),
                condition("MemoryPressure", "True", None),
                condition("DiskPressure", "True", None),
                condition("PIDPressure", "False", None),
            ],
        );
        assert_eq!(node_status(&node), "KubeletNotReady, DiskPressure, MemoryPressure");
    }

    #[test]
    fn test_status_fallbacks() {
        let not_ready = with_conditions(node("ip-1", &[]), vec![condition("Ready", "False", None)]);
        assert_eq!(node_status(&not_ready), "NotReady");

        let pressured = with_conditions(
            node("ip-1", &[]),
            vec![
                condition("Ready", "True", None),
                condition("NetworkUnavailable", "True", None),
            ],
        );
        assert_eq!(node_status(&pressured), "Ready, NetworkUnavailable");

        let unknown = with_conditions(node("ip-1", &[]), vec![]);
        assert_eq!(node_status(&unknown), "Unknown");
    }

    #[test]
    fn test_taints_formatted_in_order() {
        let node = with_taints(
            node("ip-1", &[]),
            vec![
                taint("dedicated", Some("gpu"), "NoSchedule"),
                taint("spot", None, "PreferNoSchedule"),
                taint("bare", Some(""), ""),
            ],
        );
        assert_eq!(
            node_taints(&node),
            vec!["dedicated=gpu:NoSchedule", "spot:PreferNoSchedule", "bare"]
        );
    }

    #[test]
    fn test_group_key_multiple_labels() {
        let labels: BTreeMap<String, String> = [("env", "prod"), ("team", "a")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let key = group_key(&labels, &["team".to_string(), "env".to_string()]).unwrap();

        assert_eq!(key.values, vec!["a", "prod"]);
        assert_eq!(key.display, "team=a, env=prod");
        assert!(group_key(&labels, &[]).is_none());
    }
}
