//! Column sizing for the node table
//!
//! Widths are measured once over the whole record set so every group in the
//! report lines up, then fitted to the terminal each time a table header is
//! printed. Only the node-name column ever shrinks.

use crate::models::NodeRecord;
use unicode_width::UnicodeWidthStr;

/// Width of each of the two metric columns
pub const METRIC_COLUMN_WIDTH: usize = 20;
/// Single-space separators between the six columns
pub const COLUMN_GAPS: usize = 5;
pub const MIN_NAME_WIDTH: usize = 20;
pub const MIN_TAINTS_WIDTH: usize = 15;
pub const DEFAULT_TERMINAL_WIDTH: u16 = 120;
pub const MIN_TERMINAL_WIDTH: u16 = 80;

/// Padding added to the widest value of each column
const PADDING: usize = 2;

pub const NAME_HEADER: &str = "NAME";
pub const INSTANCE_HEADER: &str = "INSTANCE";
pub const STATUS_HEADER: &str = "STATUS";
pub const TAINTS_HEADER: &str = "TAINTS";
pub const CPU_HEADER: &str = "CPU";
pub const MEMORY_HEADER: &str = "MEMORY";

/// Status fragments rendered in the taints column instead
const TAINT_EFFECT_SUFFIXES: [&str; 3] = [", NoSchedule", ", NoExecute", ", PreferNoSchedule"];

/// Widths of the variable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnWidths {
    pub name: usize,
    pub instance: usize,
    pub status: usize,
    pub taints: usize,
}

impl ColumnWidths {
    /// Measure natural widths over all records
    pub fn measure(records: &[NodeRecord]) -> Self {
        let mut widths = Self {
            name: NAME_HEADER.len() + PADDING,
            instance: INSTANCE_HEADER.len() + PADDING,
            status: STATUS_HEADER.len() + PADDING,
            taints: MIN_TAINTS_WIDTH,
        };

        for record in records {
            widths.name = widths.name.max(text_width(&record.name) + PADDING);
            widths.instance = widths
                .instance
                .max(text_width(&record.instance_type) + PADDING);
            widths.status = widths
                .status
                .max(text_width(strip_taint_suffix(&record.status)) + PADDING);
            for taint in &record.taints {
                widths.taints = widths.taints.max(text_width(taint) + PADDING);
            }
        }

        widths
    }

    /// Shrink the name column so the table fits the terminal, never below 20
    pub fn fit(self, terminal_width: u16) -> Self {
        let terminal_width = usize::from(terminal_width);
        if self.total() <= terminal_width {
            return self;
        }

        let available = terminal_width.saturating_sub(self.fixed_without_name());
        Self {
            name: available.max(MIN_NAME_WIDTH),
            ..self
        }
    }

    /// Full row width including metric columns and separators
    pub fn total(&self) -> usize {
        self.name + self.fixed_without_name()
    }

    fn fixed_without_name(&self) -> usize {
        self.instance + self.status + self.taints + 2 * METRIC_COLUMN_WIDTH + COLUMN_GAPS
    }
}

/// Remove a trailing taint-effect fragment from a status string
pub fn strip_taint_suffix(status: &str) -> &str {
    TAINT_EFFECT_SUFFIXES
        .iter()
        .find_map(|suffix| status.strip_suffix(suffix))
        .unwrap_or(status)
}

/// Display width in terminal cells
pub fn text_width(text: &str) -> usize {
    text.width()
}

/// Source of the current terminal width
pub trait WidthProbe {
    /// Current column count, `None` when it cannot be determined
    fn columns(&self) -> Option<u16>;
}

/// Queries the controlling terminal on every call
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalProbe;

impl WidthProbe for TerminalProbe {
    fn columns(&self) -> Option<u16> {
        crossterm::terminal::size().ok().map(|(columns, _)| columns)
    }
}

/// Always reports the same width
#[derive(Debug, Clone, Copy)]
pub struct FixedWidth(pub u16);

impl WidthProbe for FixedWidth {
    fn columns(&self) -> Option<u16> {
        Some(self.0)
    }
}

/// Sample the probe, defaulting to 120 columns and never below 80
pub fn terminal_width(probe: &dyn WidthProbe) -> u16 {
    probe
        .columns()
        .filter(|columns| *columns > 0)
        .unwrap_or(DEFAULT_TERMINAL_WIDTH)
        .max(MIN_TERMINAL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::fixtures::record;
    use crate::models::Category;

    struct NoTerminal;

    impl WidthProbe for NoTerminal {
        fn columns(&self) -> Option<u16> {
            None
        }
    }

    fn sample(name: &str) -> NodeRecord {
        let mut record = record(name, Category::Karpenter, "default");
        record.instance_type = "m5.large".to_string();
        record.status = "Ready".to_string();
        record
    }

    #[test]
    fn test_text_width_counts_terminal_cells() {
        assert_eq!(text_width("ip-10-0-1-1"), 11);
        assert_eq!(text_width("节点"), 4);
    }

    #[test]
    fn test_measure_uses_widest_values() {
        let mut a = sample("short");
        a.taints = vec!["dedicated=gpu-workloads:NoSchedule".to_string()];
        let mut b = sample("a-much-longer-node-name");
        b.instance_type = "c6i.12xlarge".to_string();
        b.status = "KubeletNotReady, MemoryPressure".to_string();

        let widths = ColumnWidths::measure(&[a, b]);

        assert_eq!(widths.name, 23 + 2);
        assert_eq!(widths.instance, 12 + 2);
        assert_eq!(widths.status, 31 + 2);
        assert_eq!(widths.taints, 34 + 2);
    }

    #[test]
    fn test_taints_width_floor() {
        let mut a = sample("n");
        a.taints = vec!["a:NoSchedule".to_string()];
        assert_eq!(ColumnWidths::measure(&[a]).taints, MIN_TAINTS_WIDTH);
    }

    #[test]
    fn test_status_width_ignores_taint_suffix() {
        let mut a = sample("n");
        a.status = "Ready, PreferNoSchedule".to_string();
        assert_eq!(ColumnWidths::measure(&[a]).status, STATUS_HEADER.len() + 2);
    }

    #[test]
    fn test_strip_taint_suffix() {
        assert_eq!(strip_taint_suffix("Ready, NoSchedule"), "Ready");
        assert_eq!(strip_taint_suffix("NotReady, NoExecute"), "NotReady");
        assert_eq!(strip_taint_suffix("Ready, DiskPressure"), "Ready, DiskPressure");
    }

    #[test]
    fn test_fit_leaves_narrow_tables_alone() {
        let widths = ColumnWidths::measure(&[sample("node-1")]);
        assert_eq!(widths.fit(200), widths);
    }

    #[test]
    fn test_fit_clamps_long_name_at_80_columns() {
        let long_name = "n".repeat(60);
        let widths = ColumnWidths::measure(&[sample(&long_name)]);
        assert_eq!(widths.name, 62);

        let fitted = widths.fit(80);
        let others = fitted.instance + fitted.status + fitted.taints + 40 + 5;

        assert!(fitted.name >= MIN_NAME_WIDTH);
        assert_eq!(fitted.name, MIN_NAME_WIDTH.max(80usize.saturating_sub(others)));
    }

    #[test]
    fn test_fit_shrinks_name_to_fill_terminal() {
        let long_name = "n".repeat(60);
        let widths = ColumnWidths::measure(&[sample(&long_name)]);

        let fitted = widths.fit(100);

        assert!(fitted.name > MIN_NAME_WIDTH);
        assert!(fitted.name < widths.name);
        assert_eq!(fitted.total(), 100);
    }

    #[test]
    fn test_terminal_width_defaults_and_floor() {
        assert_eq!(terminal_width(&NoTerminal), DEFAULT_TERMINAL_WIDTH);
        assert_eq!(terminal_width(&FixedWidth(0)), DEFAULT_TERMINAL_WIDTH);
        assert_eq!(terminal_width(&FixedWidth(40)), MIN_TERMINAL_WIDTH);
        assert_eq!(terminal_width(&FixedWidth(200)), 200);
    }
}
