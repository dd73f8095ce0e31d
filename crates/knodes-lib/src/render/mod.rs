//! Terminal rendering of a grouped node report
//!
//! One render function per topology. Column widths are measured once from
//! the full record set; the terminal is re-sampled before every table header
//! so a resize during a long report takes effect at the next section.

mod rows;
mod style;
mod summary;

pub use rows::{node_rows, truncate, wrap_cell};
pub use style::{percent_level, status_level, Level};
pub use summary::{format_tally, tally, ReportSummary};

use crate::grouping::{Dimension, Group, Grouping, NestedGroup};
use crate::layout::{
    self, ColumnWidths, WidthProbe, CPU_HEADER, INSTANCE_HEADER, MEMORY_HEADER,
    METRIC_COLUMN_WIDTH, NAME_HEADER, STATUS_HEADER, TAINTS_HEADER,
};
use crate::models::{Category, GroupKey, NodeRecord, PoolKey};
use colored::Colorize;
use std::io::{self, Write};

/// Writes the report for one grouping to an output stream
pub struct Renderer<'p, W: Write> {
    out: W,
    probe: &'p dyn WidthProbe,
    natural: ColumnWidths,
    widths: ColumnWidths,
}

impl<'p, W: Write> Renderer<'p, W> {
    pub fn new(out: W, records: &[NodeRecord], probe: &'p dyn WidthProbe) -> Self {
        let natural = ColumnWidths::measure(records);
        Self {
            out,
            probe,
            natural,
            widths: natural.fit(layout::terminal_width(probe)),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Widths used for the most recent table header
    pub fn widths(&self) -> ColumnWidths {
        self.widths
    }

    /// Render the grouped tables followed by the closing summary
    pub fn render(&mut self, grouping: &Grouping<'_>, records: &[NodeRecord]) -> io::Result<()> {
        if records.is_empty() {
            return self.render_empty();
        }

        match grouping {
            Grouping::Flat(all) => self.render_flat(all)?,
            Grouping::Nodepool(groups) => self.render_nodepools(groups)?,
            Grouping::Secondary { dimension, groups } => self.render_secondary(*dimension, groups)?,
            Grouping::Combined { dimension, pools } => self.render_combined(*dimension, pools)?,
        }

        self.render_summary(&ReportSummary::from_records(records))
    }

    pub fn render_empty(&mut self) -> io::Result<()> {
        writeln!(self.out, "{} {}", "⚠".yellow().bold(), "No nodes found".yellow())
    }

    fn render_flat(&mut self, records: &[&NodeRecord]) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format!("All Nodes ({} total)", records.len()).bold()
        )?;
        self.table_header()?;
        self.node_rows(records)
    }

    fn render_nodepools(&mut self, groups: &[Group<'_, PoolKey>]) -> io::Result<()> {
        for category in Category::ALL {
            let in_category: Vec<&Group<'_, PoolKey>> =
                groups.iter().filter(|g| g.key.category == category).collect();
            if in_category.is_empty() {
                continue;
            }

            let count = in_category.iter().map(|g| g.len()).sum();
            self.section_header(category, count)?;
            self.table_header()?;

            for group in in_category {
                self.pool_header(&group.key, &group.records)?;
                self.node_rows(&group.records)?;
            }
        }
        Ok(())
    }

    fn render_combined(&mut self, dimension: Dimension, pools: &[NestedGroup<'_>]) -> io::Result<()> {
        for category in Category::ALL {
            let in_category: Vec<&NestedGroup<'_>> =
                pools.iter().filter(|p| p.key.category == category).collect();
            if in_category.is_empty() {
                continue;
            }

            let count = in_category.iter().map(|p| p.len()).sum();
            self.section_header(category, count)?;
            self.table_header()?;

            for pool in in_category {
                let members: Vec<&NodeRecord> = pool.records().collect();
                self.pool_header(&pool.key, &members)?;

                for group in &pool.subgroups {
                    writeln!(
                        self.out,
                        "  {}",
                        format!(
                            "{}: {} ({} nodes)",
                            dimension.title(),
                            group.key,
                            group.len()
                        )
                        .bold()
                    )?;
                    self.node_rows(&group.records)?;
                }
            }
        }
        Ok(())
    }

    fn render_secondary(&mut self, dimension: Dimension, groups: &[Group<'_, GroupKey>]) -> io::Result<()> {
        for group in groups {
            writeln!(self.out)?;
            writeln!(
                self.out,
                "{}",
                format!("{}: {} ({} nodes)", dimension.title(), group.key, group.len()).bold()
            )?;
            self.table_header()?;
            self.node_rows(&group.records)?;
        }
        Ok(())
    }

    fn section_header(&mut self, category: Category, count: usize) -> io::Result<()> {
        writeln!(self.out)?;
        let title = format!("{} ({} nodes)", category.title(), count);
        writeln!(self.out, "{}", style::paint_category(&title, category).bold())
    }

    /// Re-sample the terminal and print the column header with its rule
    fn table_header(&mut self) -> io::Result<()> {
        self.widths = self.natural.fit(layout::terminal_width(self.probe));
        let w = self.widths;

        let header = format!(
            "{:<nw$} {:<iw$} {:<sw$} {:<tw$} {:<mw$} {}",
            NAME_HEADER,
            INSTANCE_HEADER,
            STATUS_HEADER,
            TAINTS_HEADER,
            CPU_HEADER,
            MEMORY_HEADER,
            nw = w.name,
            iw = w.instance,
            sw = w.status,
            tw = w.taints,
            mw = METRIC_COLUMN_WIDTH,
        );
        writeln!(self.out, "{}", header.bold())?;
        writeln!(self.out, "{}", "─".repeat(w.total()))
    }

    fn pool_header(&mut self, key: &PoolKey, records: &[&NodeRecord]) -> io::Result<()> {
        let title = format!("Nodepool: {} ({} nodes)", key.pool, records.len());
        writeln!(self.out, "{}", style::paint_category(&title, key.category).bold())?;

        let instances = tally(records.iter().map(|r| r.instance_type.as_str()));
        writeln!(self.out, "  Instance types: {}", format_tally(&instances))?;

        let statuses = tally(records.iter().map(|r| r.status.as_str()));
        writeln!(self.out, "  Status: {}", format_tally(&statuses))
    }

    fn node_rows(&mut self, records: &[&NodeRecord]) -> io::Result<()> {
        for record in records {
            for row in node_rows(record, &self.widths) {
                writeln!(self.out, "{}", row)?;
            }
        }
        Ok(())
    }

    fn render_summary(&mut self, summary: &ReportSummary) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Summary".bold())?;
        writeln!(self.out, "{}", "=".repeat(50))?;
        writeln!(self.out, "Total nodes: {}", summary.total)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", "Category distribution".bold())?;
        writeln!(self.out, "{}", summary.category_table())?;

        let attention = summary.attention_lines();
        if !attention.is_empty() {
            writeln!(self.out)?;
        }
        for (label, count) in attention {
            writeln!(self.out, "{}: {}", label, count.to_string().red().bold())?;
        }
        Ok(())
    }
}
