use patterns::PatternError;
use std::path::PathBuf;
use thiserror::Error;

/// Any reason a rule file or rule fails to load. Always fatal for the scan.
#[derive(Debug, Error)]
pub enum RuleCompilationError {
    #[error("failed to read rules from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: invalid rule file: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<RuleCompilationError>,
    },
    #[error("rule {rule_id}: pattern `{pattern}` is invalid: {source}")]
    Pattern {
        rule_id: String,
        pattern: String,
        #[source]
        source: PatternError,
    },
    #[error("rule {rule_id}: invalid regex `{regex}`: {source}")]
    Regex {
        rule_id: String,
        regex: String,
        #[source]
        source: regex::Error,
    },
    #[error("rule {rule_id}: metavariable ${name} is used in {context} but never bound")]
    UnboundMetavariable {
        rule_id: String,
        name: String,
        context: &'static str,
    },
    #[error("rule {rule_id}: {reason}")]
    Malformed { rule_id: String, reason: String },
    #[error("rule {rule_id}: unknown severity '{value}'")]
    UnknownSeverity { rule_id: String, value: String },
    #[error("rule {rule_id}: unknown language '{value}'")]
    UnknownLanguage { rule_id: String, value: String },
    #[error("duplicate rule id: {0}")]
    DuplicateId(String),
}

impl RuleCompilationError {
    pub(crate) fn malformed(rule_id: &str, reason: impl Into<String>) -> Self {
        RuleCompilationError::Malformed {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            already @ (RuleCompilationError::Io { .. }
            | RuleCompilationError::Yaml { .. }
            | RuleCompilationError::InFile { .. }) => already,
            other => RuleCompilationError::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}
