//! Executes one scan from resolved settings.

use anyhow::{Context, Result};
use engine::ScanReport;
use reporters::{render, Format, TextOptions};
use std::env;
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use tracing::{debug, info};

use crate::args::Cli;
use crate::config::{FileConfig, Settings, CI_ENV};
use crate::ui;

/// How a completed scan maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No findings at or above the threshold, or failing is disabled.
    Clean,
    /// Findings reached the threshold and `failOnFinding` is set.
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Clean => 0,
            Outcome::Failed => 1,
        }
    }
}

/// Exit code for errors that stop the scan before it produces a report.
pub const ERROR_EXIT_CODE: u8 = 2;

pub fn run(cli: Cli) -> Result<Outcome> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&cli, file, env::var_os(CI_ENV).is_some())?;
    execute(&settings)
}

pub fn execute(settings: &Settings) -> Result<Outcome> {
    debug!(?settings, "Resolved settings");
    if settings.format == Format::Text && !settings.quiet {
        ui::print_header();
    }

    let rules = loader::load_rules(&settings.rules)
        .with_context(|| format!("failed to load rules from {}", settings.rules.display()))?;
    let mut report = engine::scan(&settings.paths, &rules, &settings.scan)?;
    report.retain_at_or_above(settings.severity_threshold);
    write_report(settings, &report)?;

    if !settings.quiet {
        ui::print_verdict(&report, settings.severity_threshold);
    }
    let reached = report.findings_at_or_above(settings.severity_threshold);
    info!(
        findings = report.findings.len(),
        at_threshold = reached,
        threshold = %settings.severity_threshold,
        "Scan completed"
    );
    Ok(if reached > 0 && settings.fail_on_finding {
        Outcome::Failed
    } else {
        Outcome::Clean
    })
}

fn write_report(settings: &Settings, report: &ScanReport) -> Result<()> {
    match &settings.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            render(&mut out, report, settings.format, TextOptions::default())?;
            out.flush()?;
            info!(path = %path.display(), "Report written");
        }
        None => {
            let stdout = io::stdout();
            let color = io::stdout().is_terminal() && ui::use_colored_output();
            let mut out = stdout.lock();
            render(&mut out, report, settings.format, TextOptions { color })?;
            out.flush()?;
        }
    }
    Ok(())
}
