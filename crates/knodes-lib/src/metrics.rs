//! Normalization of raw per-node usage figures
//!
//! Metrics-server data is best effort: a node that has just joined, or a
//! cluster without metrics-server, reports `<unknown>`. Every parser here
//! degrades to zero instead of failing so one node can never abort a report.

use serde::Serialize;

/// Token printed by `kubectl top` when metrics are unavailable
pub const UNKNOWN_TOKEN: &str = "<unknown>";

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;
const TIB: f64 = GIB * 1024.0;

/// Raw usage figures for one node, in `kubectl top nodes` form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawNodeMetrics {
    pub cpu_usage: String,
    pub cpu_percent: String,
    pub mem_usage: String,
    pub mem_percent: String,
}

impl RawNodeMetrics {
    pub fn new(
        cpu_usage: impl Into<String>,
        cpu_percent: impl Into<String>,
        mem_usage: impl Into<String>,
        mem_percent: impl Into<String>,
    ) -> Self {
        Self {
            cpu_usage: cpu_usage.into(),
            cpu_percent: cpu_percent.into(),
            mem_usage: mem_usage.into(),
            mem_percent: mem_percent.into(),
        }
    }

    /// Metrics for a node the metrics snapshot knows nothing about
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_TOKEN, UNKNOWN_TOKEN, UNKNOWN_TOKEN, UNKNOWN_TOKEN)
    }

    /// Parse one line of `kubectl top nodes` output
    ///
    /// Fields may be separated by whitespace and/or commas. Header lines and
    /// lines with fewer than five fields yield `None`.
    pub fn from_top_line(line: &str) -> Option<(String, Self)> {
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());

        let name = fields.next()?;
        if name.eq_ignore_ascii_case("NAME") {
            return None;
        }

        let cpu_usage = fields.next()?;
        let cpu_percent = fields.next()?;
        let mem_usage = fields.next()?;
        let mem_percent = fields.next()?;

        Some((
            name.to_string(),
            Self::new(cpu_usage, cpu_percent, mem_usage, mem_percent),
        ))
    }

    /// Build `kubectl top` style figures from metrics API quantities
    ///
    /// Percentages are computed against the node's allocatable resources,
    /// the same way `kubectl top nodes` does.
    pub fn from_usage(
        cpu: &str,
        memory: &str,
        allocatable_cpu: Option<&str>,
        allocatable_memory: Option<&str>,
    ) -> Self {
        let cpu_m = cpu_millicores(cpu);
        let mem_bytes = memory_bytes(memory);

        let cpu_usage = cpu_m
            .map(|m| format!("{}m", m))
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string());
        let cpu_percent = ratio_percent(cpu_m, allocatable_cpu.and_then(cpu_millicores));

        let mem_usage = mem_bytes
            .map(|b| format!("{}Mi", b / MIB as u64))
            .unwrap_or_else(|| UNKNOWN_TOKEN.to_string());
        let mem_percent = ratio_percent(mem_bytes, allocatable_memory.and_then(memory_bytes));

        Self {
            cpu_usage,
            cpu_percent,
            mem_usage,
            mem_percent,
        }
    }
}

fn ratio_percent(used: Option<u64>, total: Option<u64>) -> String {
    match (used, total) {
        (Some(used), Some(total)) if total > 0 => format!("{}%", used * 100 / total),
        _ => UNKNOWN_TOKEN.to_string(),
    }
}

/// Canonical numeric metrics for one node
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMetrics {
    pub cpu_usage: String,
    pub cpu_percent: u8,
    pub mem_usage_gb: f64,
    pub mem_percent: u8,
    pub mem_capacity_gb: f64,
}

/// Normalize raw usage figures and the node's raw memory capacity
pub fn normalize(raw: &RawNodeMetrics, mem_capacity: &str) -> NormalizedMetrics {
    let cpu_usage = match raw.cpu_usage.trim() {
        "" | UNKNOWN_TOKEN => "0m".to_string(),
        usage => usage.to_string(),
    };

    NormalizedMetrics {
        cpu_usage,
        cpu_percent: parse_percent(&raw.cpu_percent),
        mem_usage_gb: mem_usage_gb(&raw.mem_usage),
        mem_percent: parse_percent(&raw.mem_percent),
        mem_capacity_gb: mem_capacity_gb(mem_capacity),
    }
}

/// Parse a percentage such as `"42%"`, clamped to [0, 100]
pub fn parse_percent(raw: &str) -> u8 {
    let trimmed = raw.trim().trim_end_matches('%');
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value.clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

/// Memory usage in GiB; a bare number is taken as MiB
pub fn mem_usage_gb(raw: &str) -> f64 {
    parse_memory(raw, MIB).map(|b| b / GIB).unwrap_or(0.0)
}

/// Memory capacity in GiB; a bare number is taken as KiB
pub fn mem_capacity_gb(raw: &str) -> f64 {
    parse_memory(raw, KIB).map(|b| b / GIB).unwrap_or(0.0)
}

/// Convert a CPU quantity (`"250m"`, `"2"`, `"123456789n"`) to millicores
pub fn cpu_millicores(raw: &str) -> Option<u64> {
    let (value, suffix) = split_quantity(raw)?;
    let millis = match suffix {
        "n" => value / 1_000_000.0,
        "u" => value / 1_000.0,
        "m" => value,
        "" => value * 1_000.0,
        "k" => value * 1_000_000.0,
        _ => return None,
    };
    (millis.is_finite() && millis >= 0.0).then(|| millis.ceil() as u64)
}

/// Convert a memory quantity (`"1048576Ki"`, `"2Gi"`, `"1000000"`) to bytes
pub fn memory_bytes(raw: &str) -> Option<u64> {
    parse_memory(raw, 1.0).map(|b| b as u64)
}

fn parse_memory(raw: &str, default_multiplier: f64) -> Option<f64> {
    let (value, suffix) = split_quantity(raw)?;
    let multiplier = match suffix {
        "" => default_multiplier,
        "Ki" => KIB,
        "Mi" => MIB,
        "Gi" => GIB,
        "Ti" => TIB,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        _ => return None,
    };
    let bytes = value * multiplier;
    (bytes.is_finite() && bytes >= 0.0).then_some(bytes)
}

fn split_quantity(raw: &str) -> Option<(f64, &str)> {
    let raw = raw.trim();
    if raw.is_empty() || raw == UNKNOWN_TOKEN {
        return None;
    }
    let split = raw
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(raw.len());
    let (number, suffix) = raw.split_at(split);
    let value = number.parse::<f64>().ok()?;
    Some((value, suffix))
}
