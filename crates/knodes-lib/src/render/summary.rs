//! Group and report summaries

use super::style::{paint_category, ALERT_PERCENT};
use crate::models::{Category, NodeRecord};
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

/// Count occurrences, most frequent first, ties alphabetical
pub fn tally<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }

    let mut tally: Vec<(&str, usize)> = counts.into_iter().collect();
    tally.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    tally
}

/// Render a tally as `a (3), b (1)`
pub fn format_tally(tally: &[(&str, usize)]) -> String {
    tally
        .iter()
        .map(|(label, count)| format!("{} ({})", label, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Row for category distribution table
#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Nodes")]
    nodes: usize,
    #[tabled(rename = "Share")]
    share: String,
}

/// Totals printed at the end of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    /// Most populated category first, ties in priority order
    pub categories: Vec<(Category, usize)>,
    pub high_cpu: usize,
    pub high_memory: usize,
    pub not_ready: usize,
    pub tainted: usize,
}

impl ReportSummary {
    pub fn from_records(records: &[NodeRecord]) -> Self {
        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        for record in records {
            *by_category.entry(record.category).or_default() += 1;
        }
        let mut categories: Vec<(Category, usize)> = by_category.into_iter().collect();
        categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let count = |predicate: fn(&NodeRecord) -> bool| {
            records.iter().filter(|&r| predicate(r)).count()
        };

        Self {
            total: records.len(),
            categories,
            high_cpu: count(|r| r.cpu_percent >= ALERT_PERCENT),
            high_memory: count(|r| r.mem_percent >= ALERT_PERCENT),
            not_ready: count(|r| !r.is_ready()),
            tainted: count(NodeRecord::is_tainted),
        }
    }

    /// Category distribution as a rounded table, each category in its color
    pub fn category_table(&self) -> String {
        let rows: Vec<CategoryRow> = self
            .categories
            .iter()
            .map(|(category, nodes)| CategoryRow {
                category: paint_category(category.as_str(), *category).to_string(),
                nodes: *nodes,
                share: format!("{:.0}%", *nodes as f64 * 100.0 / self.total.max(1) as f64),
            })
            .collect();

        Table::new(rows).with(Style::rounded()).to_string()
    }

    /// Attention lines with their counts; zero counts are omitted
    pub fn attention_lines(&self) -> Vec<(String, usize)> {
        [
            (format!("Nodes with CPU >= {}%", ALERT_PERCENT), self.high_cpu),
            (format!("Nodes with memory >= {}%", ALERT_PERCENT), self.high_memory),
            ("Nodes not ready".to_string(), self.not_ready),
            ("Tainted nodes".to_string(), self.tainted),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::fixtures::record;
    use crate::render::color_guard;
    use colored::Colorize;

    #[test]
    fn test_tally_order() {
        let tally = tally(["m5.large", "c5.xlarge", "m5.large", "a1.medium", "c5.xlarge", "m5.large"]);
        assert_eq!(tally, vec![("m5.large", 3), ("c5.xlarge", 2), ("a1.medium", 1)]);
        assert_eq!(format_tally(&tally), "m5.large (3), c5.xlarge (2), a1.medium (1)");
    }

    #[test]
    fn test_tally_ties_alphabetical() {
        let tally = tally(["b", "a", "c"]);
        assert_eq!(tally, vec![("a", 1), ("b", 1), ("c", 1)]);
    }

    #[test]
    fn test_summary_counts() {
        let mut records = vec![
            record("n1", Category::EksManaged, "ng"),
            record("n2", Category::Karpenter, "A"),
            record("n3", Category::Karpenter, "B"),
            record("n4", Category::Fargate, "fargate"),
        ];
        records[0].cpu_percent = 85;
        records[1].mem_percent = 80;
        records[1].cpu_percent = 79;
        records[2].status = "NotReady, DiskPressure".to_string();
        records[3].taints = vec!["eks.amazonaws.com/compute-type=fargate:NoSchedule".to_string()];
        records[3].status = "Ready, MemoryPressure".to_string();

        let summary = ReportSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(
            summary.categories,
            vec![
                (Category::Karpenter, 2),
                (Category::EksManaged, 1),
                (Category::Fargate, 1),
            ]
        );
        assert_eq!(summary.high_cpu, 1);
        assert_eq!(summary.high_memory, 1);
        assert_eq!(summary.not_ready, 1);
        assert_eq!(summary.tainted, 1);
    }

    #[test]
    fn test_attention_lines_omit_zero_counts() {
        let records = vec![record("n1", Category::Unknown, "none")];
        let summary = ReportSummary::from_records(&records);
        assert!(summary.attention_lines().is_empty());

        let mut records = records;
        records[0].cpu_percent = 95;
        let lines = ReportSummary::from_records(&records).attention_lines();
        assert_eq!(lines, vec![("Nodes with CPU >= 80%".to_string(), 1)]);
    }

    #[test]
    fn test_category_table_contents() {
        let records = vec![
            record("n1", Category::Karpenter, "A"),
            record("n2", Category::Karpenter, "A"),
            record("n3", Category::Unknown, "none"),
            record("n4", Category::Unknown, "none"),
        ];
        let _colors = color_guard::colors(false);
        let table = ReportSummary::from_records(&records).category_table();

        assert!(table.contains("Category"));
        assert!(table.contains("karpenter"));
        assert!(table.contains("50%"));
        let karpenter = table.find("karpenter").unwrap();
        let unknown = table.find("unknown").unwrap();
        assert!(karpenter < unknown);
    }

    #[test]
    fn test_category_cells_use_category_color() {
        let records = vec![
            record("n1", Category::Karpenter, "A"),
            record("n2", Category::EksManaged, "ng"),
        ];

        let _colors = color_guard::colors(true);
        let table = ReportSummary::from_records(&records).category_table();

        assert!(table.contains(&"karpenter".magenta().to_string()));
        assert!(table.contains(&"eks-managed".blue().to_string()));
    }

    #[test]
    fn test_category_table_aligned_with_colors() {
        let records = vec![
            record("n1", Category::Karpenter, "A"),
            record("n2", Category::Unknown, "none"),
        ];

        let plain = {
            let _colors = color_guard::colors(false);
            ReportSummary::from_records(&records).category_table()
        };
        let colored = {
            let _colors = color_guard::colors(true);
            ReportSummary::from_records(&records).category_table()
        };

        assert_ne!(colored, plain);
        assert_eq!(strip_ansi(&colored), plain);
    }

    fn strip_ansi(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\u{1b}' {
                chars.by_ref().find(|c| c.is_ascii_alphabetic());
            } else {
                out.push(ch);
            }
        }
        out
    }
}
