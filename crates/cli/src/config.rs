//! Configuration file loading and merging with command-line flags.

use engine::{default_excludes, ScanConfig, Severity, DEFAULT_MAX_FILE_SIZE, DEFAULT_SUPPRESS_COMMENT};
use reporters::Format;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::args::Cli;

/// Environment variable whose presence means "running in CI".
pub const CI_ENV: &str = "CI";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("no rules given; pass --rules or set `rules` in the config file")]
    MissingRules,
}

/// Contents of a `--config` TOML file. Keys are camelCase; snake_case
/// spellings are accepted as aliases.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(alias = "timeout_seconds")]
    pub timeout_seconds: Option<u64>,
    #[serde(alias = "severity_threshold")]
    pub severity_threshold: Option<String>,
    #[serde(alias = "output_format")]
    pub output_format: Option<String>,
    #[serde(alias = "fail_on_finding")]
    pub fail_on_finding: Option<bool>,
    #[serde(alias = "file_timeout_seconds")]
    pub file_timeout_seconds: Option<u64>,
    pub threads: Option<usize>,
    #[serde(alias = "max_file_size")]
    pub max_file_size: Option<u64>,
    #[serde(alias = "suppress_comment")]
    pub suppress_comment: Option<String>,
    pub rules: Option<PathBuf>,
}

impl FileConfig {
    /// Reads `path`. A relative `rules` entry is resolved against the
    /// directory holding the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, path)?;
        if let (Some(rules), Some(dir)) = (&config.rules, path.parent()) {
            if rules.is_relative() {
                config.rules = Some(dir.join(rules));
            }
        }
        Ok(config)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub paths: Vec<PathBuf>,
    pub rules: PathBuf,
    pub format: Format,
    pub severity_threshold: Severity,
    pub fail_on_finding: bool,
    pub output: Option<PathBuf>,
    pub quiet: bool,
    pub scan: ScanConfig,
}

impl Settings {
    /// Merges `file` with `cli`; flags win. `in_ci` selects the default
    /// timeout: none in CI, [`DEFAULT_TIMEOUT_SECS`] elsewhere. A zero
    /// timeout or size limit disables that limit.
    pub fn resolve(cli: &Cli, file: FileConfig, in_ci: bool) -> Result<Self, ConfigurationError> {
        let rules = cli
            .rules
            .clone()
            .or(file.rules)
            .ok_or(ConfigurationError::MissingRules)?;

        let format = match (cli.format, &file.output_format) {
            (Some(format), _) => format,
            (None, Some(name)) => name.parse().map_err(|e: reporters::UnknownFormat| {
                ConfigurationError::InvalidValue {
                    key: "outputFormat",
                    reason: e.to_string(),
                }
            })?,
            (None, None) => Format::Text,
        };

        let severity_threshold = match (cli.severity_threshold, &file.severity_threshold) {
            (Some(severity), _) => severity,
            (None, Some(name)) => {
                name.parse()
                    .map_err(|reason| ConfigurationError::InvalidValue {
                        key: "severityThreshold",
                        reason,
                    })?
            }
            (None, None) => Severity::Info,
        };

        let timeout_secs = match cli.timeout.or(file.timeout_seconds) {
            Some(secs) => Some(secs),
            None if in_ci => None,
            None => Some(DEFAULT_TIMEOUT_SECS),
        };

        let mut include = file.include;
        include.extend(cli.include.iter().cloned());
        let mut exclude = default_excludes();
        exclude.extend(file.exclude);
        exclude.extend(cli.exclude.iter().cloned());

        let suppress_comment = match file.suppress_comment {
            Some(marker) if marker.trim().is_empty() => None,
            Some(marker) => Some(marker),
            None => Some(DEFAULT_SUPPRESS_COMMENT.to_string()),
        };

        Ok(Self {
            paths: cli.paths.clone(),
            rules,
            format,
            severity_threshold,
            fail_on_finding: !cli.no_fail_on_finding && file.fail_on_finding.unwrap_or(true),
            output: cli.output.clone(),
            quiet: cli.quiet,
            scan: ScanConfig {
                include,
                exclude,
                timeout: timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
                file_timeout: file
                    .file_timeout_seconds
                    .filter(|s| *s > 0)
                    .map(Duration::from_secs),
                threads: cli.threads.or(file.threads).unwrap_or(0),
                max_file_size: match file.max_file_size {
                    Some(0) => None,
                    Some(limit) => Some(limit),
                    None => Some(DEFAULT_MAX_FILE_SIZE),
                },
                suppress_comment,
            },
        })
    }
}
