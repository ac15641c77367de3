//! Banner and verdict lines written to stderr.

use colored::Colorize;
use engine::{ScanReport, Severity};
use std::env;
use std::io::{self, IsTerminal};

/// Whether ANSI colors suit the current terminal.
pub fn use_colored_output() -> bool {
    if env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" || term == "unknown" {
            return false;
        }
    }
    if env::var_os("CI").is_some() || env::var_os("CONTINUOUS_INTEGRATION").is_some() {
        return false;
    }
    io::stderr().is_terminal()
}

pub fn print_header() {
    let version = env!("CARGO_PKG_VERSION");
    let spaces = " ".repeat(24usize.saturating_sub(version.len()));
    eprintln!(
        r#"
    ╭──────────────────────────────────────╮
    │                                      │
    │     SASTGATE  SECURITY  SCANNER      │
    │     Version: {version}{spaces}│
    │                                      │
    ╰──────────────────────────────────────╯
"#
    );
}

/// One-line outcome: how many findings reached `threshold`.
pub fn print_verdict(report: &ScanReport, threshold: Severity) {
    let count = report.findings_at_or_above(threshold);
    let line = if count == 0 {
        format!("✔ No findings at or above {threshold}")
    } else {
        format!("✖ {count} finding(s) at or above {threshold}")
    };
    if !use_colored_output() {
        eprintln!("{line}");
    } else if count == 0 {
        eprintln!("{}", line.bright_green().bold());
    } else {
        eprintln!("{}", line.bright_red().bold());
    }
    if report.incomplete {
        let note = "⚠ Scan incomplete; some files were not analysed";
        if use_colored_output() {
            eprintln!("{}", note.bright_yellow());
        } else {
            eprintln!("{note}");
        }
    }
}
