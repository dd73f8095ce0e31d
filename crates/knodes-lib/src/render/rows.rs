//! Node row formatting
//!
//! A node with taints spans several physical lines: the primary row carries
//! every column plus the first wrapped taint segment, and each further
//! segment (of any taint) gets a continuation row where only the taints
//! column is filled.

use super::style::{paint, percent_level, status_level};
use crate::layout::{text_width, ColumnWidths, METRIC_COLUMN_WIDTH};
use crate::models::NodeRecord;
use std::borrow::Cow;
use unicode_width::UnicodeWidthChar;

const ELLIPSIS: char = '…';

/// Content width of a padded column
fn content_width(column: usize) -> usize {
    column.saturating_sub(2).max(1)
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text_width(text));
    format!("{}{}", text, " ".repeat(fill))
}

/// Cut text to `width` terminal cells, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> Cow<'_, str> {
    if text_width(text) <= width {
        return Cow::Borrowed(text);
    }
    if width == 0 {
        return Cow::Borrowed("");
    }

    let budget = width - 1;
    let mut cut = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > budget {
            break;
        }
        cut.push(ch);
        used += w;
    }
    cut.push(ELLIPSIS);
    Cow::Owned(cut)
}

/// Wrap text into segments of at most `width` terminal cells
///
/// Breaks after whitespace where possible and splits tokens longer than the
/// width. Concatenating the segments gives back the input unchanged.
pub fn wrap_cell(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in text.split_inclusive(char::is_whitespace) {
        let token_width = text_width(token);
        if current_width + token_width <= width {
            current.push_str(token);
            current_width += token_width;
            continue;
        }

        if current_width > 0 {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }

        for ch in token.chars() {
            let w = char_width(ch);
            if current_width > 0 && current_width + w > width {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(ch);
            current_width += w;
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn cpu_cell(record: &NodeRecord) -> String {
    format!(
        "{}/{} ({}%)",
        record.cpu_usage, record.cpu_capacity, record.cpu_percent
    )
}

pub fn memory_cell(record: &NodeRecord) -> String {
    format!(
        "{:.1}/{:.1}GB ({}%)",
        record.mem_usage_gb, record.mem_capacity_gb, record.mem_percent
    )
}

/// All physical lines for one node
pub fn node_rows(record: &NodeRecord, widths: &ColumnWidths) -> Vec<String> {
    let segments: Vec<String> = record
        .taints
        .iter()
        .flat_map(|taint| wrap_cell(taint, content_width(widths.taints)))
        .collect();
    let first_segment = segments.first().map(String::as_str).unwrap_or("");

    let name = truncate(&record.name, content_width(widths.name));
    let status = paint(&pad(&record.status, widths.status), status_level(&record.status));
    let cpu = paint(
        &pad(
            &truncate(&cpu_cell(record), content_width(METRIC_COLUMN_WIDTH)),
            METRIC_COLUMN_WIDTH,
        ),
        percent_level(record.cpu_percent),
    );
    let memory = paint(&memory_cell(record), percent_level(record.mem_percent));

    let mut rows = Vec::with_capacity(segments.len().max(1));
    rows.push(format!(
        "{} {} {} {} {} {}",
        pad(&name, widths.name),
        pad(&record.instance_type, widths.instance),
        status,
        pad(first_segment, widths.taints),
        cpu,
        memory,
    ));

    for segment in segments.iter().skip(1) {
        rows.push(continuation_row(segment, widths));
    }
    rows
}

fn continuation_row(segment: &str, widths: &ColumnWidths) -> String {
    format!(
        "{} {} {} {}",
        pad("", widths.name),
        pad("", widths.instance),
        pad("", widths.status),
        segment
    )
}
