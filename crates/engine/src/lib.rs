//! Rule evaluation engine.
//!
//! [`scan`] enumerates files, parses them on a rayon pool and evaluates
//! every applicable rule, producing a deterministic [`ScanReport`]. Lower
//! level entry points ([`match_pattern`], [`analyze_tree`]) work on a single
//! parsed tree.

mod control;
mod formula;
mod matcher;
mod path;
mod report;
mod scan;
mod taint;

pub use control::{Interrupted, ScanControl};
pub use loader::{Rule, RuleSet, Severity};
pub use matcher::{match_pattern, Bindings, Match};
pub use path::{glob_to_regex, PathFilter};
pub use report::{
    Completion, FileErrorKind, FileScanError, Finding, ScanReport, ScanTimeoutError, Summary,
};
pub use scan::{
    analyze_tree, default_excludes, scan, scan_source, scan_with_control, ScanConfig, ScanError,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_SUPPRESS_COMMENT,
};
