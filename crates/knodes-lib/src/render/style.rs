//! Semantic color coding

use crate::models::Category;
use colored::{Color, ColoredString, Colorize};

pub const ALERT_PERCENT: u8 = 80;
pub const WARN_PERCENT: u8 = 50;

/// Status fragments that indicate a degraded but not failed node
const WARN_MARKERS: [&str; 4] = ["Pressure", "NetworkUnavailable", "NoSchedule", "NoExecute"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Nominal,
    Warn,
    Alert,
}

pub fn percent_level(percent: u8) -> Level {
    if percent >= ALERT_PERCENT {
        Level::Alert
    } else if percent >= WARN_PERCENT {
        Level::Warn
    } else {
        Level::Nominal
    }
}

pub fn status_level(status: &str) -> Level {
    if status == "Ready" {
        Level::Nominal
    } else if WARN_MARKERS.iter().any(|marker| status.contains(marker)) {
        Level::Warn
    } else {
        Level::Alert
    }
}

pub fn paint(text: &str, level: Level) -> ColoredString {
    match level {
        Level::Nominal => text.green(),
        Level::Warn => text.yellow(),
        Level::Alert => text.red(),
    }
}

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Karpenter => Color::Magenta,
        Category::EksManaged => Color::Blue,
        Category::EksSelfManaged => Color::Cyan,
        Category::Fargate => Color::Green,
        Category::Unknown => Color::White,
    }
}

pub fn paint_category(text: &str, category: Category) -> ColoredString {
    text.color(category_color(category))
}
