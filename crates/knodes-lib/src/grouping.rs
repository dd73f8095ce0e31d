//! Grouping of node records along the requested dimensions
//!
//! The topology is chosen once from the request flags and the records are
//! then partitioned into an ordered structure. All maps are `BTreeMap`s keyed
//! by types whose `Ord` encodes the report order, so output never depends on
//! hash iteration order.

use crate::models::{GroupKey, NodeRecord, PoolKey};
use crate::record::KeySelection;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Order of records within a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Highest CPU percentage first
    #[default]
    Cpu,
    /// Highest memory percentage first
    Memory,
    /// Alphabetical by node name
    Name,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(SortKey::Cpu),
            "memory" | "mem" => Ok(SortKey::Memory),
            "name" => Ok(SortKey::Name),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Secondary grouping dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Label,
    Tag,
}

impl Dimension {
    /// Prefix used in group headers
    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Label => "Labels",
            Dimension::Tag => "Instance tags",
        }
    }
}

/// Shape of the grouped report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Every node in a single group
    Flat,
    /// One group per `category:pool`
    Nodepool,
    /// One group per label or tag tuple
    Secondary(Dimension),
    /// Nodepool groups subdivided by label or tag tuple
    Combined(Dimension),
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Flat => f.write_str("flat"),
            Topology::Nodepool => f.write_str("nodepool"),
            Topology::Secondary(Dimension::Label) => f.write_str("labels"),
            Topology::Secondary(Dimension::Tag) => f.write_str("tags"),
            Topology::Combined(Dimension::Label) => f.write_str("nodepool+labels"),
            Topology::Combined(Dimension::Tag) => f.write_str("nodepool+tags"),
        }
    }
}

/// Grouping flags as given by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingRequest {
    pub labels: Vec<String>,
    pub tags: Vec<String>,
    pub by_nodepool: bool,
    pub show_all: bool,
}

impl GroupingRequest {
    /// Select the topology
    ///
    /// `show_all` overrides every other flag. Labels take precedence over
    /// tags when both are requested. With no flags at all the report is
    /// grouped by nodepool.
    pub fn topology(&self) -> Topology {
        if self.show_all {
            return Topology::Flat;
        }

        let secondary = if !self.labels.is_empty() {
            Some(Dimension::Label)
        } else if !self.tags.is_empty() {
            Some(Dimension::Tag)
        } else {
            None
        };

        match (self.by_nodepool, secondary) {
            (true, Some(dimension)) => Topology::Combined(dimension),
            (false, Some(dimension)) => Topology::Secondary(dimension),
            (_, None) => Topology::Nodepool,
        }
    }

    pub fn key_selection(&self) -> KeySelection {
        KeySelection {
            labels: self.labels.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Records sharing one key, already sorted
#[derive(Debug, Clone)]
pub struct Group<'a, K> {
    pub key: K,
    pub records: Vec<&'a NodeRecord>,
}

impl<K> Group<'_, K> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A nodepool subdivided by a secondary key
#[derive(Debug, Clone)]
pub struct NestedGroup<'a> {
    pub key: PoolKey,
    pub subgroups: Vec<Group<'a, GroupKey>>,
}

impl<'a> NestedGroup<'a> {
    pub fn len(&self) -> usize {
        self.subgroups.iter().map(Group::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> impl Iterator<Item = &'a NodeRecord> + '_ {
        self.subgroups.iter().flat_map(|g| g.records.iter().copied())
    }
}

/// Records partitioned according to a topology
#[derive(Debug, Clone)]
pub enum Grouping<'a> {
    Flat(Vec<&'a NodeRecord>),
    Nodepool(Vec<Group<'a, PoolKey>>),
    Secondary {
        dimension: Dimension,
        groups: Vec<Group<'a, GroupKey>>,
    },
    Combined {
        dimension: Dimension,
        pools: Vec<NestedGroup<'a>>,
    },
}

impl Grouping<'_> {
    pub fn topology(&self) -> Topology {
        match self {
            Grouping::Flat(_) => Topology::Flat,
            Grouping::Nodepool(_) => Topology::Nodepool,
            Grouping::Secondary { dimension, .. } => Topology::Secondary(*dimension),
            Grouping::Combined { dimension, .. } => Topology::Combined(*dimension),
        }
    }
}

/// Partition records into the given topology
pub fn group_records(records: &[NodeRecord], topology: Topology, sort: SortKey) -> Grouping<'_> {
    match topology {
        Topology::Flat => {
            let mut all: Vec<&NodeRecord> = records.iter().collect();
            sort_records(&mut all, sort);
            Grouping::Flat(all)
        }
        Topology::Nodepool => {
            Grouping::Nodepool(partition(records.iter(), NodeRecord::pool_key, sort))
        }
        Topology::Secondary(dimension) => Grouping::Secondary {
            dimension,
            groups: partition(records.iter(), |r| secondary_key(r, dimension), sort),
        },
        Topology::Combined(dimension) => {
            let mut pools: BTreeMap<PoolKey, Vec<&NodeRecord>> = BTreeMap::new();
            for record in records {
                pools.entry(record.pool_key()).or_default().push(record);
            }

            let pools = pools
                .into_iter()
                .map(|(key, members)| NestedGroup {
                    key,
                    subgroups: partition(
                        members.into_iter(),
                        |r| secondary_key(r, dimension),
                        sort,
                    ),
                })
                .collect();

            Grouping::Combined { dimension, pools }
        }
    }
}

fn partition<'a, K, I, F>(records: I, key_fn: F, sort: SortKey) -> Vec<Group<'a, K>>
where
    K: Ord,
    I: Iterator<Item = &'a NodeRecord>,
    F: Fn(&NodeRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&'a NodeRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key_fn(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, mut records)| {
            sort_records(&mut records, sort);
            Group { key, records }
        })
        .collect()
}

fn secondary_key(record: &NodeRecord, dimension: Dimension) -> GroupKey {
    let key = match dimension {
        Dimension::Label => &record.group_keys.labels,
        Dimension::Tag => &record.group_keys.tags,
    };
    key.clone().unwrap_or_default()
}

/// Sort records in place; ties are broken by name
pub fn sort_records(records: &mut [&NodeRecord], sort: SortKey) {
    records.sort_by(|a, b| compare(a, b, sort));
}

fn compare(a: &NodeRecord, b: &NodeRecord, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Cpu => b.cpu_percent.cmp(&a.cpu_percent),
        SortKey::Memory => b.mem_percent.cmp(&a.mem_percent),
        SortKey::Name => Ordering::Equal,
    };
    primary.then_with(|| a.name.cmp(&b.name))
}
