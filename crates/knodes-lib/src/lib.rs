//! Node report library for Kubernetes clusters
//!
//! This crate provides the core functionality for:
//! - Node classification by provisioner (Karpenter, EKS, eksctl, Fargate)
//! - Metrics normalization from `kubectl top` / metrics API figures
//! - Multi-dimensional grouping of nodes
//! - Terminal-sized, color-coded tabular rendering

pub mod classifier;
pub mod grouping;
pub mod layout;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod record;
pub mod render;
pub mod report;
pub mod snapshot;

pub use grouping::{GroupingRequest, SortKey, Topology};
pub use layout::{FixedWidth, TerminalProbe, WidthProbe};
pub use models::*;
pub use observability::ReportLogger;
pub use report::{Report, ReportOptions};
pub use snapshot::{ClusterSnapshot, SnapshotError};
