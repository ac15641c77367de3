use clap::Parser;
use engine::Severity;
use reporters::Format;
use std::path::PathBuf;

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

fn parse_format(s: &str) -> Result<Format, String> {
    s.parse().map_err(|e: reporters::UnknownFormat| e.to_string())
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    if v == 0 {
        Err("threads must be greater than 0".into())
    } else {
        Ok(v)
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sastgate",
    author,
    version,
    about = "Rule-driven static security scanner for CI pipelines",
    long_about = "sastgate matches YAML security rules against Python, JavaScript and TypeScript \
sources and fails the build when findings reach the configured severity.

Exit codes:
  0  no findings at or above the threshold
  1  findings at or above the threshold
  2  scan error (rules, configuration or no files matched)

Examples:
  sastgate --rules rules/ src/
  sastgate --rules rules/ --format sarif --output report.sarif .
  sastgate --config sastgate.toml app.py"
)]
pub struct Cli {
    /// Files or directories to scan
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Rule file or directory of rule files
    #[arg(long)]
    pub rules: Option<PathBuf>,
    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format: text, json or sarif
    #[arg(long, value_parser = parse_format)]
    pub format: Option<Format>,
    /// Lowest severity that fails the scan
    #[arg(long = "severity-threshold", value_parser = parse_severity)]
    pub severity_threshold: Option<Severity>,
    /// Wall-clock limit for the whole scan in seconds; 0 disables it
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Only scan files matching these globs
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,
    /// Skip files matching these globs
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
    /// Number of worker threads
    #[arg(long, value_parser = parse_threads)]
    pub threads: Option<usize>,
    /// Exit with 0 even when findings reach the threshold
    #[arg(long = "no-fail-on-finding")]
    pub no_fail_on_finding: bool,
    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
    /// Suppress logging and the banner
    #[arg(long, short = 'q', conflicts_with = "debug")]
    pub quiet: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_severity_rejects_invalid_input() {
        assert!(parse_severity("bogus").is_err());
        assert_eq!(parse_severity("warn").unwrap(), Severity::Warning);
    }

    #[test]
    fn zero_threads_are_rejected() {
        assert!(parse_threads("0").is_err());
        assert_eq!(parse_threads("4").unwrap(), 4);
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "sastgate",
            "--rules",
            "rules",
            "--format",
            "json",
            "--exclude",
            "a/**,b/**",
            "--severity-threshold",
            "error",
            "src",
            "app.py",
        ])
        .unwrap();
        assert_eq!(cli.paths, vec![PathBuf::from("src"), PathBuf::from("app.py")]);
        assert_eq!(cli.format, Some(Format::Json));
        assert_eq!(cli.exclude, vec!["a/**", "b/**"]);
        assert_eq!(cli.severity_threshold, Some(Severity::Error));
    }

    #[test]
    fn paths_are_required() {
        assert!(Cli::try_parse_from(["sastgate", "--rules", "r"]).is_err());
    }
}
