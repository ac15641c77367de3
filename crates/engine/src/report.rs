use loader::Severity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Result of evaluating a rule over a file.
pub struct Finding {
    /// Stable identifier derived from rule, file and position.
    pub id: String,
    pub rule_id: String,
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub severity: Severity,
    /// Message with `$METAVARS` replaced by the matched text.
    pub message: String,
    /// Metavariable name to matched source text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub bindings: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cwe: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    /// Source line where the match starts.
    pub excerpt: String,
}

impl Finding {
    pub(crate) fn make_id(rule_id: &str, file: &std::path::Path, line: usize, column: usize) -> String {
        blake3::hash(format!("{}:{}:{}:{}", rule_id, file.display(), line, column).as_bytes())
            .to_hex()
            .to_string()
    }

    fn location_key(&self) -> (PathBuf, usize, usize, usize, usize, String) {
        (
            self.file.clone(),
            self.line,
            self.column,
            self.end_line,
            self.end_column,
            self.rule_id.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileErrorKind {
    Read,
    Parse,
    Interrupted,
}

/// A file that could not be scanned. Recorded in the report; never fatal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{}: {message}", .path.display())]
pub struct FileScanError {
    pub path: PathBuf,
    pub kind: FileErrorKind,
    pub message: String,
    pub severity: Severity,
}

impl FileScanError {
    pub fn new(path: impl Into<PathBuf>, kind: FileErrorKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
            severity: Severity::Warning,
        }
    }
}

/// The scan-wide deadline expired before every file was processed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("scan timed out after {timeout_secs}s: {files_completed} of {files_total} files completed")]
pub struct ScanTimeoutError {
    pub timeout_secs: u64,
    pub files_completed: usize,
    pub files_total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub rules_loaded: usize,
    pub findings: usize,
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub duration_ms: u128,
}

impl Summary {
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }

    fn recount(&mut self, findings: &[Finding]) {
        self.findings = findings.len();
        self.info = 0;
        self.warning = 0;
        self.error = 0;
        for finding in findings {
            match finding.severity {
                Severity::Info => self.info += 1,
                Severity::Warning => self.warning += 1,
                Severity::Error => self.error += 1,
            }
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis();
    }
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Complete,
    Cancelled,
    TimedOut(ScanTimeoutError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanReport {
    /// Sorted by file, line, column and rule id.
    pub findings: Vec<Finding>,
    pub errors: Vec<FileScanError>,
    pub summary: Summary,
    /// Some files were not scanned because of cancellation or timeout.
    pub incomplete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<ScanTimeoutError>,
}

impl ScanReport {
    /// Merges per-file batches, drops exact duplicates (same rule, file and
    /// span) and fixes the order. Severity counts in `summary` are recomputed.
    pub fn assemble(
        batches: Vec<Vec<Finding>>,
        mut errors: Vec<FileScanError>,
        mut summary: Summary,
        completion: Completion,
    ) -> Self {
        let mut findings: Vec<Finding> = batches.into_iter().flatten().collect();
        findings.sort_by(|a, b| {
            (&a.file, a.line, a.column, &a.rule_id, a.end_line, a.end_column).cmp(&(
                &b.file,
                b.line,
                b.column,
                &b.rule_id,
                b.end_line,
                b.end_column,
            ))
        });
        let mut seen = HashSet::new();
        findings.retain(|f| seen.insert(f.location_key()));
        errors.sort_by(|a, b| a.path.cmp(&b.path));

        summary.recount(&findings);
        summary.files_failed = errors.len();

        let (incomplete, timeout) = match completion {
            Completion::Complete => (false, None),
            Completion::Cancelled => (true, None),
            Completion::TimedOut(err) => (true, Some(err)),
        };
        Self {
            findings,
            errors,
            summary,
            incomplete,
            timeout,
        }
    }

    /// Drops findings below `threshold` and recounts the summary.
    pub fn retain_at_or_above(&mut self, threshold: Severity) {
        self.findings.retain(|f| f.severity >= threshold);
        self.summary.recount(&self.findings);
    }

    /// Number of findings whose severity is at least `threshold`.
    pub fn findings_at_or_above(&self, threshold: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity >= threshold)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(rule: &str, file: &str, line: usize, severity: Severity) -> Finding {
        Finding {
            id: Finding::make_id(rule, std::path::Path::new(file), line, 1),
            rule_id: rule.into(),
            file: file.into(),
            line,
            column: 1,
            end_line: line,
            end_column: 10,
            severity,
            message: "m".into(),
            bindings: BTreeMap::new(),
            cwe: Vec::new(),
            remediation: None,
            excerpt: String::new(),
        }
    }

    #[test]
    fn assemble_sorts_and_removes_exact_duplicates() {
        let report = ScanReport::assemble(
            vec![
                vec![finding("b", "z.py", 3, Severity::Info)],
                vec![
                    finding("a", "a.py", 9, Severity::Error),
                    finding("a", "a.py", 2, Severity::Warning),
                    finding("a", "a.py", 2, Severity::Warning),
                ],
            ],
            vec![FileScanError::new("bad.py", FileErrorKind::Parse, "syntax error")],
            Summary::default(),
            Completion::Complete,
        );
        let order: Vec<(&str, usize)> = report
            .findings
            .iter()
            .map(|f| (f.file.to_str().unwrap(), f.line))
            .collect();
        assert_eq!(order, vec![("a.py", 2), ("a.py", 9), ("z.py", 3)]);
        assert_eq!(report.summary.findings, 3);
        assert_eq!(report.summary.count(Severity::Warning), 1);
        assert_eq!(report.summary.files_failed, 1);
        assert_eq!(report.errors[0].severity, Severity::Warning);
        assert!(!report.incomplete);
        assert_eq!(report.findings_at_or_above(Severity::Warning), 2);
    }

    #[test]
    fn threshold_drops_lower_severities_and_recounts() {
        let mut report = ScanReport::assemble(
            vec![vec![
                finding("a", "a.py", 1, Severity::Info),
                finding("b", "a.py", 2, Severity::Warning),
                finding("c", "a.py", 3, Severity::Error),
            ]],
            Vec::new(),
            Summary::default(),
            Completion::Complete,
        );
        report.retain_at_or_above(Severity::Warning);
        let rules: Vec<&str> = report.findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(rules, vec!["b", "c"]);
        assert_eq!(report.summary.findings, 2);
        assert_eq!(report.summary.info, 0);
        assert_eq!(report.summary.warning, 1);
        assert_eq!(report.summary.error, 1);

        report.retain_at_or_above(Severity::Info);
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn timed_out_reports_are_incomplete() {
        let timeout = ScanTimeoutError {
            timeout_secs: 1,
            files_completed: 2,
            files_total: 5,
        };
        let report = ScanReport::assemble(
            Vec::new(),
            Vec::new(),
            Summary::default(),
            Completion::TimedOut(timeout.clone()),
        );
        assert!(report.incomplete);
        assert_eq!(report.timeout, Some(timeout));
        assert!(report
            .timeout
            .as_ref()
            .unwrap()
            .to_string()
            .contains("2 of 5"));
    }

    #[test]
    fn ids_are_stable() {
        let a = Finding::make_id("r", std::path::Path::new("a.py"), 1, 2);
        assert_eq!(a, Finding::make_id("r", std::path::Path::new("a.py"), 1, 2));
        assert_ne!(a, Finding::make_id("r", std::path::Path::new("a.py"), 1, 3));
    }
}
