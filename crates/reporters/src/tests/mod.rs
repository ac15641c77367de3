use engine::{
    Completion, FileErrorKind, FileScanError, Finding, ScanReport, ScanTimeoutError, Severity,
    Summary,
};
use std::collections::BTreeMap;
use std::path::PathBuf;


fn finding(rule: &str, file: &str, line: usize, severity: Severity) -> Finding {
    Finding {
        id: format!("{rule}-{file}-{line}"),
        rule_id: rule.into(),
        file: PathBuf::from(file),
        line,
        column: 5,
        end_line: line,
        end_column: 20,
        severity,
        message: format!("{rule} message"),
        bindings: BTreeMap::new(),
        cwe: vec!["CWE-89: SQL Injection".into()],
        remediation: Some("use parameters".into()),
        excerpt: "cursor.execute(q + x)".into(),
    }
}

fn sample_report() -> ScanReport {
    ScanReport::assemble(
        vec![vec![
            finding("low", "a.py", 3, Severity::Info),
            finding("sqli", "b.py", 7, Severity::Error),
            finding("warn", "a.py", 9, Severity::Warning),
            finding("sqli", "a.py", 2, Severity::Error),
        ]],
        vec![FileScanError::new("bad.py", FileErrorKind::Parse, "syntax error at line 1, column 4")],
        Summary {
            files_scanned: 2,
            rules_loaded: 3,
            ..Summary::default()
        },
        Completion::Complete,
    )
}

fn timed_out_report() -> ScanReport {
    ScanReport::assemble(
        Vec::new(),
        Vec::new(),
        Summary::default(),
        Completion::TimedOut(ScanTimeoutError {
            timeout_secs: 5,
            files_completed: 1,
            files_total: 4,
        }),
    )
}
