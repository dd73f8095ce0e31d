//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use knodes_lib::{FixedWidth, SortKey, TerminalProbe, WidthProbe};

/// Output format for the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grouped, color-coded tables (default)
    #[default]
    Table,
    /// JSON array of node records
    Json,
}

/// Sort order for nodes within each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// CPU usage percentage, highest first
    Cpu,
    /// Memory usage percentage, highest first
    #[value(alias = "mem")]
    Memory,
    /// Node name, ascending
    Name,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Cpu => SortKey::Cpu,
            SortArg::Memory => SortKey::Memory,
            SortArg::Name => SortKey::Name,
        }
    }
}

/// Width source for table layout: a configured width wins over the terminal
pub fn width_probe(configured: Option<u16>) -> Box<dyn WidthProbe> {
    match configured {
        Some(width) => Box::new(FixedWidth(width)),
        None => Box::new(TerminalProbe),
    }
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}
