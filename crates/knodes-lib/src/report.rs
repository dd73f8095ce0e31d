//! The report pipeline: snapshot → records → grouping → rendering

use crate::grouping::{self, Grouping, GroupingRequest, SortKey, Topology};
use crate::layout::WidthProbe;
use crate::models::NodeRecord;
use crate::record;
use crate::render::Renderer;
use crate::snapshot::ClusterSnapshot;
use std::io::{self, Write};

/// User choices that shape the report
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub grouping: GroupingRequest,
    pub sort: SortKey,
}

/// Records built from one snapshot, ready to render
#[derive(Debug, Clone)]
pub struct Report {
    records: Vec<NodeRecord>,
    topology: Topology,
    sort: SortKey,
}

impl Report {
    pub fn build(snapshot: &ClusterSnapshot, options: &ReportOptions) -> Self {
        let selection = options.grouping.key_selection();
        let records = record::build_records(snapshot, &selection);

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            records = records.len(),
            metrics = snapshot.metrics.len(),
            "Built node records"
        );

        Self {
            records,
            topology: options.grouping.topology(),
            sort: options.sort,
        }
    }

    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn grouping(&self) -> Grouping<'_> {
        grouping::group_records(&self.records, self.topology, self.sort)
    }

    /// Render the table report
    pub fn render<W: Write>(&self, out: W, probe: &dyn WidthProbe) -> io::Result<W> {
        let mut renderer = Renderer::new(out, &self.records, probe);
        renderer.render(&self.grouping(), &self.records)?;
        Ok(renderer.into_inner())
    }

    /// Write all records as a JSON array in sort order
    pub fn write_json<W: Write>(&self, out: W) -> serde_json::Result<()> {
        let mut sorted: Vec<&NodeRecord> = self.records.iter().collect();
        grouping::sort_records(&mut sorted, self.sort);
        serde_json::to_writer_pretty(out, &sorted)
    }
}
