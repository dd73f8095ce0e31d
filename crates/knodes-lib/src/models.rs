//! Core data models for the node report

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Provisioning mechanism that owns a node
///
/// Variant order is the report's section order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Karpenter,
    EksManaged,
    EksSelfManaged,
    Fargate,
    Unknown,
}

impl Category {
    /// All categories in priority order
    pub const ALL: [Category; 5] = [
        Category::Karpenter,
        Category::EksManaged,
        Category::EksSelfManaged,
        Category::Fargate,
        Category::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Karpenter => "karpenter",
            Category::EksManaged => "eks-managed",
            Category::EksSelfManaged => "eks-self-managed",
            Category::Fargate => "fargate",
            Category::Unknown => "unknown",
        }
    }

    /// Section title used in grouped reports
    pub fn title(&self) -> &'static str {
        match self {
            Category::Karpenter => "Karpenter Nodes",
            Category::EksManaged => "EKS Managed Nodegroups",
            Category::EksSelfManaged => "EKS Self-Managed Nodegroups",
            Category::Fargate => "Fargate Nodes",
            Category::Unknown => "Unclassified Nodes",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output for a single node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub pool: String,
}

impl Classification {
    pub fn new(category: Category, pool: impl Into<String>) -> Self {
        Self {
            category,
            pool: pool.into(),
        }
    }

    /// Fallback for nodes no detector recognises
    pub fn unknown() -> Self {
        Self::new(Category::Unknown, "none")
    }
}

/// Nodepool grouping key, rendered as `category:pool`
///
/// Ordering is category priority first, then pool name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PoolKey {
    pub category: Category,
    pub pool: String,
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.pool)
    }
}

/// Tuple of label values used as a secondary grouping key
///
/// Ordered by its display string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct GroupKey {
    pub display: String,
    pub values: Vec<String>,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Pre-computed secondary grouping projections
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<GroupKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<GroupKey>,
}

/// One row of the report, built once per node per invocation
#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    pub name: String,
    pub category: Category,
    pub pool: String,
    pub instance_type: String,
    pub status: String,
    pub taints: Vec<String>,
    pub cpu_capacity: String,
    pub cpu_usage: String,
    pub cpu_percent: u8,
    pub mem_percent: u8,
    pub mem_capacity_gb: f64,
    pub mem_usage_gb: f64,
    pub labels: BTreeMap<String, String>,
    pub group_keys: GroupKeys,
}

impl NodeRecord {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            category: self.category,
            pool: self.pool.clone(),
        }
    }

    /// True when the base status (before any pressure conditions) is Ready
    pub fn is_ready(&self) -> bool {
        self.status.split(',').next().map(str::trim) == Some("Ready")
    }

    pub fn is_tainted(&self) -> bool {
        !self.taints.is_empty()
    }
}
