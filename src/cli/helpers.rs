//! Shared helper functions for CLI commands

use chrono::{DateTime, Utc};

use crate::entities::product::DEFAULT_UNIT;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an optional dimension, "-" when absent
pub fn format_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// A BOM line given on the command line as `NUMBER[:QTY[:UNIT]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpec {
    pub material_number: String,
    pub quantity: u32,
    pub unit: String,
}

impl std::str::FromStr for LineSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let number = parts.next().unwrap_or_default().trim();
        if number.is_empty() {
            return Err(format!("Missing material number in '{}'", s));
        }
        let quantity = match parts.next().map(str::trim) {
            None | Some("") => 1,
            Some(q) => q
                .parse::<u32>()
                .map_err(|_| format!("Invalid quantity '{}' in '{}'", q, s))?,
        };
        let unit = match parts.next().map(str::trim) {
            None | Some("") => DEFAULT_UNIT.to_string(),
            Some(u) => u.to_string(),
        };
        Ok(Self {
            material_number: number.to_string(),
            quantity,
            unit,
        })
    }
}

/// A per-line assignment given as `LINE=VALUE` (lines are numbered from 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineAssignment {
    pub line: usize,
    pub value: String,
}

impl LineAssignment {
    /// Zero-based position of the addressed line
    pub fn index(&self) -> usize {
        self.line - 1
    }
}

impl std::str::FromStr for LineAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, value) = s
            .split_once('=')
            .ok_or_else(|| format!("Expected LINE=VALUE, got '{}'", s))?;
        let line = line
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| format!("Invalid line number in '{}'", s))?;
        Ok(Self {
            line,
            value: value.trim().to_string(),
        })
    }
}
