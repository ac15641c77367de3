use engine::{FileScanError, Finding, ScanReport, ScanTimeoutError, Summary};
use serde::Serialize;

use crate::order_findings;

/// Document written by the `json` format.
#[derive(Serialize)]
pub(crate) struct JsonReport<'a> {
    findings: Vec<&'a Finding>,
    summary: &'a Summary,
    errors: &'a [FileScanError],
    incomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<&'a ScanTimeoutError>,
}

impl<'a> JsonReport<'a> {
    pub(crate) fn new(report: &'a ScanReport) -> Self {
        Self {
            findings: order_findings(&report.findings),
            summary: &report.summary,
            errors: &report.errors,
            incomplete: report.incomplete,
            timeout: report.timeout.as_ref(),
        }
    }
}
