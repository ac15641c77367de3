use engine::{ScanReport, Severity};
use std::io::{self, Write};

use crate::{order_findings, TextOptions};

/// Severity label, wrapped in ANSI codes when `color` is set.
pub fn color_severity(severity: Severity, color: bool) -> String {
    let text = severity.to_string();
    if !color {
        return text;
    }
    let code = match severity {
        Severity::Info => "\x1b[32m",
        Severity::Warning => "\x1b[33m",
        Severity::Error => "\x1b[31m",
    };
    format!("{code}{text}\x1b[0m")
}

fn simple_box(title: &str) -> String {
    let width = title.chars().count() + 2;
    format!(
        "╭{}╮\n│ {} │\n╰{}╯",
        "─".repeat(width),
        title,
        "─".repeat(width)
    )
}

pub(crate) fn write_text<W: Write>(
    out: &mut W,
    report: &ScanReport,
    options: TextOptions,
) -> io::Result<()> {
    writeln!(out, "{}", simple_box("Results"))?;
    writeln!(out)?;
    if report.findings.is_empty() {
        writeln!(out, "✔ No issues found.")?;
    } else {
        writeln!(out, "⚠ Found {} issue(s):\n", report.findings.len())?;
        for f in order_findings(&report.findings) {
            writeln!(
                out,
                "{} {}:{}:{} {}",
                color_severity(f.severity, options.color),
                f.file.display(),
                f.line,
                f.column,
                f.rule_id
            )?;
            writeln!(out, "    {}", f.message)?;
            if !f.excerpt.is_empty() {
                writeln!(out, "    ↳  {}", f.excerpt)?;
            }
            for cwe in &f.cwe {
                writeln!(out, "    • {cwe}")?;
            }
            if let Some(r) = &f.remediation {
                writeln!(out, "    • Remediation: {r}")?;
            }
            writeln!(out)?;
        }
    }

    if !report.errors.is_empty() {
        writeln!(out, "⚠ {} file(s) could not be scanned:", report.errors.len())?;
        for err in &report.errors {
            writeln!(out, "    {err}")?;
        }
        writeln!(out)?;
    }

    let s = &report.summary;
    writeln!(out, "{}", simple_box("Summary"))?;
    writeln!(out)?;
    writeln!(
        out,
        "    Scanned {} file(s) with {} rule(s) in {}ms ({} skipped, {} failed)",
        s.files_scanned, s.rules_loaded, s.duration_ms, s.files_skipped, s.files_failed
    )?;
    writeln!(
        out,
        "    Findings: {} ({} error, {} warning, {} info)",
        s.findings, s.error, s.warning, s.info
    )?;
    if report.incomplete {
        match &report.timeout {
            Some(timeout) => writeln!(out, "    Incomplete: {timeout}")?,
            None => writeln!(out, "    Incomplete: scan was cancelled")?,
        }
    }
    Ok(())
}
