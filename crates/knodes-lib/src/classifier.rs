//! Node classification by provisioning mechanism
//!
//! Classification runs an ordered chain of detectors; the first detector that
//! recognises a node wins. A node can carry more than one provisioning label
//! (for example after migrating a nodegroup to Karpenter), so the chain puts
//! the most specific signals first. Supporting a new provisioner means
//! inserting a detector at its priority position in [`DETECTORS`].

use crate::models::{Category, Classification};
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub const KARPENTER_NODEPOOL_LABEL: &str = "karpenter.sh/nodepool";
pub const KARPENTER_PROVISIONER_LABEL: &str = "karpenter.sh/provisioner-name";
pub const EKS_NODEGROUP_LABEL: &str = "eks.amazonaws.com/nodegroup";
pub const EKSCTL_NODEGROUP_LABEL: &str = "alpha.eksctl.io/nodegroup-name";
pub const FARGATE_PROFILE_LABEL: &str = "eks.amazonaws.com/fargate-profile";
pub const INSTANCE_TYPE_LABEL: &str = "node.kubernetes.io/instance-type";
pub const BETA_INSTANCE_TYPE_LABEL: &str = "beta.kubernetes.io/instance-type";

const FARGATE_NAME_PREFIX: &str = "fargate";

static NO_LABELS: BTreeMap<String, String> = BTreeMap::new();

/// Read-only view of the node fields classification depends on
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub name: &'a str,
    pub labels: &'a BTreeMap<String, String>,
    pub allocatable: Option<&'a BTreeMap<String, Quantity>>,
}

impl<'a> NodeView<'a> {
    pub fn new(name: &'a str, labels: &'a BTreeMap<String, String>) -> Self {
        Self {
            name,
            labels,
            allocatable: None,
        }
    }

    pub fn from_node(node: &'a Node) -> Self {
        Self {
            name: node.metadata.name.as_deref().unwrap_or_default(),
            labels: node.metadata.labels.as_ref().unwrap_or(&NO_LABELS),
            allocatable: node.status.as_ref().and_then(|s| s.allocatable.as_ref()),
        }
    }

    pub fn label(&self, key: &str) -> Option<&'a str> {
        self.labels.get(key).map(String::as_str)
    }

    fn allocatable(&self, resource: &str) -> Option<&'a str> {
        self.allocatable
            .and_then(|a| a.get(resource))
            .map(|q| q.0.as_str())
    }
}

/// A single step of the classification chain
pub type Detector = fn(&NodeView<'_>) -> Option<Classification>;

/// Detectors in priority order
pub const DETECTORS: &[Detector] = &[
    detect_karpenter_nodepool,
    detect_karpenter_provisioner,
    detect_eks_managed,
    detect_eks_self_managed,
    detect_fargate,
];

/// Classify a node; always returns a classification
pub fn classify(view: &NodeView<'_>) -> Classification {
    DETECTORS
        .iter()
        .find_map(|detect| detect(view))
        .unwrap_or_else(Classification::unknown)
}

fn label_detector(view: &NodeView<'_>, key: &str, category: Category) -> Option<Classification> {
    view.label(key)
        .map(|pool| Classification::new(category, pool))
}

pub fn detect_karpenter_nodepool(view: &NodeView<'_>) -> Option<Classification> {
    label_detector(view, KARPENTER_NODEPOOL_LABEL, Category::Karpenter)
}

/// Pre-v1beta1 Karpenter provisioners
pub fn detect_karpenter_provisioner(view: &NodeView<'_>) -> Option<Classification> {
    label_detector(view, KARPENTER_PROVISIONER_LABEL, Category::Karpenter)
}

pub fn detect_eks_managed(view: &NodeView<'_>) -> Option<Classification> {
    label_detector(view, EKS_NODEGROUP_LABEL, Category::EksManaged)
}

pub fn detect_eks_self_managed(view: &NodeView<'_>) -> Option<Classification> {
    label_detector(view, EKSCTL_NODEGROUP_LABEL, Category::EksSelfManaged)
}

pub fn detect_fargate(view: &NodeView<'_>) -> Option<Classification> {
    if !view.name.starts_with(FARGATE_NAME_PREFIX) {
        return None;
    }
    let pool = match view.label(FARGATE_PROFILE_LABEL) {
        Some(profile) => format!("fargate-{}", profile),
        None => "fargate".to_string(),
    };
    Some(Classification::new(Category::Fargate, pool))
}

/// Instance type label, or a synthesized descriptor for Fargate
pub fn instance_type(view: &NodeView<'_>, classification: &Classification) -> String {
    if let Some(instance) = view
        .label(INSTANCE_TYPE_LABEL)
        .or_else(|| view.label(BETA_INSTANCE_TYPE_LABEL))
    {
        return instance.to_string();
    }

    match classification.category {
        Category::Fargate => fargate_instance_type(view),
        _ => "unknown".to_string(),
    }
}

/// `fargate-<cpu>vCPU-<mem>GB` from allocatable resources (memory in KiB)
fn fargate_instance_type(view: &NodeView<'_>) -> String {
    let cpu = view.allocatable("cpu").unwrap_or("0");
    let mem_kib: u64 = view
        .allocatable("memory")
        .map(|m| m.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse().ok())
        .unwrap_or(0);
    format!("fargate-{}vCPU-{}GB", cpu, mem_kib / (1024 * 1024))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_classify_each_category() {
        let cases = [
            ("ip-1", labels(&[(KARPENTER_NODEPOOL_LABEL, "general")]), Category::Karpenter, "general"),
            ("ip-2", labels(&[(KARPENTER_PROVISIONER_LABEL, "legacy")]), Category::Karpenter, "legacy"),
            ("ip-3", labels(&[(EKS_NODEGROUP_LABEL, "ng-1")]), Category::EksManaged, "ng-1"),
            ("ip-4", labels(&[(EKSCTL_NODEGROUP_LABEL, "workers")]), Category::EksSelfManaged, "workers"),
            ("fargate-ip-5", labels(&[]), Category::Fargate, "fargate"),
            ("ip-6", labels(&[("team", "a")]), Category::Unknown, "none"),
        ];

        for (name, labels, category, pool) in cases {
            let result = classify(&NodeView::new(name, &labels));
            assert_eq!(result, Classification::new(category, pool), "node {}", name);
        }
    }

    #[test]
    fn test_priority_order_first_match_wins() {
        let labels = labels(&[
            (EKS_NODEGROUP_LABEL, "old-ng"),
            (KARPENTER_NODEPOOL_LABEL, "new-pool"),
            (EKSCTL_NODEGROUP_LABEL, "self"),
        ]);
        let result = classify(&NodeView::new("fargate-ip-1", &labels));
        assert_eq!(result, Classification::new(Category::Karpenter, "new-pool"));
    }

    #[test]
    fn test_fargate_profile_pool() {
        let labels = labels(&[(FARGATE_PROFILE_LABEL, "default")]);
        let result = classify(&NodeView::new("fargate-ip-10-0-0-1", &labels));
        assert_eq!(result, Classification::new(Category::Fargate, "fargate-default"));

        // The profile label alone is not enough; the name decides
        let result = classify(&NodeView::new("ip-10-0-0-1", &labels));
        assert_eq!(result.category, Category::Unknown);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let labels = labels(&[(EKS_NODEGROUP_LABEL, "ng-1")]);
        let view = NodeView::new("ip-1", &labels);
        assert_eq!(classify(&view), classify(&view));
    }

    #[test]
    fn test_instance_type_from_labels() {
        let labels = labels(&[(BETA_INSTANCE_TYPE_LABEL, "m4.large")]);
        let view = NodeView::new("ip-1", &labels);
        assert_eq!(instance_type(&view, &classify(&view)), "m4.large");

        let labels = self::labels(&[
            (INSTANCE_TYPE_LABEL, "m5.xlarge"),
            (BETA_INSTANCE_TYPE_LABEL, "m4.large"),
        ]);
        let view = NodeView::new("ip-1", &labels);
        assert_eq!(instance_type(&view, &classify(&view)), "m5.xlarge");

        let empty = self::labels(&[]);
        let view = NodeView::new("ip-1", &empty);
        assert_eq!(instance_type(&view, &classify(&view)), "unknown");
    }

    #[test]
    fn test_fargate_instance_type_synthesized() {
        let labels = labels(&[]);
        let allocatable: BTreeMap<String, Quantity> = [
            ("cpu".to_string(), Quantity("2".to_string())),
            ("memory".to_string(), Quantity("4194304Ki".to_string())),
        ]
        .into_iter()
        .collect();
        let view = NodeView {
            name: "fargate-ip-1",
            labels: &labels,
            allocatable: Some(&allocatable),
        };

        assert_eq!(instance_type(&view, &classify(&view)), "fargate-2vCPU-4GB");
    }

    #[test]
    fn test_fargate_instance_type_without_allocatable() {
        let labels = labels(&[]);
        let view = NodeView::new("fargate-ip-1", &labels);
        assert_eq!(instance_type(&view, &classify(&view)), "fargate-0vCPU-0GB");
    }
}
