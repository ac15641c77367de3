//! Formatters for scan reports in text, JSON and SARIF.
//!
//! Rendering reads the [`ScanReport`] and never modifies it. Every format
//! lists findings most severe first, then by file, line and column.

use engine::{Finding, ScanReport};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

mod json;
mod sarif;
mod text;

pub use text::color_severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Supported output formats.
pub enum Format {
    /// Human-readable output in plain text.
    #[default]
    Text,
    /// JSON structure for integrations.
    Json,
    /// Report conforming to the SARIF 2.1.0 specification.
    Sarif,
}

#[derive(Debug, Error)]
#[error("unknown output format `{0}` (expected text, json or sarif)")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            "sarif" => Ok(Format::Sarif),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Text => "text",
            Format::Json => "json",
            Format::Sarif => "sarif",
        })
    }
}

/// Options that only affect the text format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    /// Wrap severities in ANSI color codes.
    pub color: bool,
}

/// Findings in presentation order: severity descending, then file path,
/// line and column.
pub fn order_findings(findings: &[Finding]) -> Vec<&Finding> {
    let mut ordered: Vec<&Finding> = findings.iter().collect();
    ordered.sort_by(|a, b| {
        (Reverse(a.severity), &a.file, a.line, a.column, &a.rule_id).cmp(&(
            Reverse(b.severity),
            &b.file,
            b.line,
            b.column,
            &b.rule_id,
        ))
    });
    ordered
}

/// Writes `report` to `out` in the selected format.
///
/// # Example
/// ```
/// use engine::{Completion, ScanReport, Summary};
/// use reporters::{render, Format, TextOptions};
/// let report = ScanReport::assemble(Vec::new(), Vec::new(), Summary::default(), Completion::Complete);
/// let mut out = Vec::new();
/// render(&mut out, &report, Format::Text, TextOptions::default()).unwrap();
/// assert!(String::from_utf8(out).unwrap().contains("No issues found"));
/// ```
pub fn render<W: Write>(
    out: &mut W,
    report: &ScanReport,
    format: Format,
    options: TextOptions,
) -> io::Result<()> {
    debug!(%format, findings = report.findings.len(), "Rendering report");
    match format {
        Format::Text => text::write_text(out, report, options),
        Format::Json => {
            serde_json::to_writer_pretty(&mut *out, &json::JsonReport::new(report))?;
            writeln!(out)
        }
        Format::Sarif => {
            serde_json::to_writer_pretty(&mut *out, &sarif::to_sarif(report))?;
            writeln!(out)
        }
    }
}

/// Renders `report` into a string; text output is uncolored.
pub fn render_to_string(report: &ScanReport, format: Format) -> io::Result<String> {
    let mut buf = Vec::new();
    render(&mut buf, report, format, TextOptions::default())?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests;
