//! File enumeration and parallel dispatch of a scan.

use ir::SyntaxTree;
use loader::{Rule, RuleMode, RuleSet, Uniqueness};
use parsers::{detect_language, parse_source, Language, ParseError};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::control::{Interrupted, ScanControl};
use crate::formula::Evaluator;
use crate::matcher::Match;
use crate::path::PathFilter;
use crate::report::{
    Completion, FileErrorKind, FileScanError, Finding, ScanReport, ScanTimeoutError, Summary,
};
use crate::taint::eval_taint;

pub const DEFAULT_SUPPRESS_COMMENT: &str = "nosast";
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

pub fn default_excludes() -> Vec<String> {
    vec!["**/.git/**".into(), "**/node_modules/**".into()]
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Globs a file must match to be scanned; empty means every file.
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Wall-clock limit for the whole scan. Files already started finish.
    pub timeout: Option<Duration>,
    /// Matching limit for a single file; a file over it is recorded as a
    /// [`FileScanError`] and the scan goes on. `None` disables the limit.
    pub file_timeout: Option<Duration>,
    /// Worker threads; `0` lets rayon decide.
    pub threads: usize,
    /// Larger files are skipped. `None` disables the limit.
    pub max_file_size: Option<u64>,
    /// Findings on a line containing this marker are dropped.
    pub suppress_comment: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_excludes(),
            timeout: None,
            file_timeout: None,
            threads: 0,
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            suppress_comment: Some(DEFAULT_SUPPRESS_COMMENT.to_string()),
        }
    }
}

/// Failures that prevent a scan from starting.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid glob `{pattern}`: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no files matched the given paths")]
    NoFilesMatched,
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

enum FileOutcome {
    Done(Vec<Finding>),
    Failed(FileScanError),
    NotStarted,
}

struct Enumeration {
    files: Vec<(PathBuf, Language)>,
    skipped: usize,
}

/// Scans `paths` with a deadline taken from `config.timeout`.
pub fn scan(
    paths: &[PathBuf],
    rules: &RuleSet,
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    let control = ScanControl::with_timeout(config.timeout);
    scan_with_control(paths, rules, config, &control)
}

/// Scans `paths`, stopping early when `control` is cancelled or expires.
///
/// Files are dispatched on a rayon pool. Once `control` fires no new file
/// is started, while files in flight run to completion and keep their
/// findings. A file that cannot be read, parsed or matched within
/// `config.file_timeout` becomes a [`FileScanError`]; it never aborts the
/// scan.
pub fn scan_with_control(
    paths: &[PathBuf],
    rules: &RuleSet,
    config: &ScanConfig,
    control: &ScanControl,
) -> Result<ScanReport, ScanError> {
    let started = Instant::now();
    let filter = PathFilter::new(&config.include, &config.exclude)
        .map_err(|(pattern, source)| ScanError::InvalidGlob { pattern, source })?;
    let Enumeration { files, skipped } = enumerate(paths, rules, config, &filter)?;
    if files.is_empty() {
        return Err(ScanError::NoFilesMatched);
    }
    info!(
        files = files.len(),
        skipped,
        rules = rules.len(),
        "Scan started"
    );

    let mut builder = ThreadPoolBuilder::new();
    if config.threads > 0 {
        builder = builder.num_threads(config.threads);
    }
    let pool = builder.build()?;
    let outcomes: Vec<FileOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|(path, language)| scan_file(path, *language, rules, config, control))
            .collect()
    });

    let total = files.len();
    let mut batches = Vec::new();
    let mut errors = Vec::new();
    let mut not_started = 0usize;
    for outcome in outcomes {
        match outcome {
            FileOutcome::Done(findings) => batches.push(findings),
            FileOutcome::Failed(err) => errors.push(err),
            FileOutcome::NotStarted => not_started += 1,
        }
    }

    let completion = if not_started == 0 {
        Completion::Complete
    } else if control.deadline_passed() {
        let err = ScanTimeoutError {
            timeout_secs: config.timeout.map_or(0, |t| t.as_secs()),
            files_completed: total - not_started,
            files_total: total,
        };
        warn!(%err, "Scan timed out");
        Completion::TimedOut(err)
    } else {
        warn!(not_started, "Scan cancelled");
        Completion::Cancelled
    };

    let mut summary = Summary {
        files_scanned: batches.len(),
        files_skipped: skipped,
        rules_loaded: rules.len(),
        ..Summary::default()
    };
    summary.set_duration(started.elapsed());
    let report = ScanReport::assemble(batches, errors, summary, completion);
    info!(
        findings = report.findings.len(),
        errors = report.errors.len(),
        incomplete = report.incomplete,
        duration_ms = report.summary.duration_ms as u64,
        "Scan finished"
    );
    Ok(report)
}

fn enumerate(
    paths: &[PathBuf],
    rules: &RuleSet,
    config: &ScanConfig,
    filter: &PathFilter,
) -> Result<Enumeration, ScanError> {
    let languages: BTreeSet<Language> = rules.languages();
    let mut files = Vec::new();
    let mut skipped = 0usize;

    let mut consider = |path: &Path, root: &Path| {
        if !filter.allows(path, root) {
            debug!(file = %path.display(), "Path excluded");
            skipped += 1;
            return;
        }
        let Some(language) = detect_language(path) else {
            skipped += 1;
            return;
        };
        if !languages.contains(&language) {
            debug!(file = %path.display(), %language, "No rule targets language");
            skipped += 1;
            return;
        }
        if let Some(limit) = config.max_file_size {
            if fs::metadata(path).map(|m| m.len() > limit).unwrap_or(false) {
                debug!(file = %path.display(), limit, "File exceeds size limit");
                skipped += 1;
                return;
            }
        }
        files.push((path.to_path_buf(), language));
    };

    for root in paths {
        let metadata = fs::symlink_metadata(root).map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;
        if metadata.is_file() {
            let base = root.parent().unwrap_or_else(|| Path::new(""));
            consider(root, base);
            continue;
        }
        let excludes = |p: &Path| p != root.as_path() && p.is_dir() && filter.excludes_dir(p, root);
        loader::visit(root, &excludes, &mut |path: &Path| -> io::Result<()> {
            consider(path, root);
            Ok(())
        })
        .map_err(|source| ScanError::Io {
            path: root.clone(),
            source,
        })?;
    }

    files.sort();
    files.dedup();
    Ok(Enumeration { files, skipped })
}

fn scan_file(
    path: &Path,
    language: Language,
    rules: &RuleSet,
    config: &ScanConfig,
    control: &ScanControl,
) -> FileOutcome {
    if control.should_stop() {
        return FileOutcome::NotStarted;
    }
    control.file_started(path);
    debug!(file = %path.display(), %language, "Scanning file");
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to read file");
            return FileOutcome::Failed(FileScanError::new(path, FileErrorKind::Read, e.to_string()));
        }
    };
    let tree = match parse_source(path, language, source) {
        Ok(tree) => tree,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Failed to parse file");
            return FileOutcome::Failed(parse_failure(path, e));
        }
    };
    let budget = config
        .file_timeout
        .map(|limit| ScanControl::with_timeout(Some(limit)));
    match analyze_tree(
        &tree,
        language,
        rules,
        config.suppress_comment.as_deref(),
        budget.as_ref(),
    ) {
        Ok(findings) => FileOutcome::Done(findings),
        Err(Interrupted) => {
            warn!(file = %path.display(), "File time limit exceeded");
            FileOutcome::Failed(FileScanError::new(
                path,
                FileErrorKind::Interrupted,
                "matching exceeded the per-file time limit",
            ))
        }
    }
}

fn parse_failure(path: &Path, err: ParseError) -> FileScanError {
    match err {
        ParseError::Syntax { line, column, .. } => FileScanError::new(
            path,
            FileErrorKind::Parse,
            format!("syntax error at line {line}, column {column}"),
        ),
        ParseError::Io { source, .. } => {
            FileScanError::new(path, FileErrorKind::Read, source.to_string())
        }
        other => FileScanError::new(path, FileErrorKind::Parse, other.to_string()),
    }
}

/// Parses and matches one in-memory file. The language comes from the
/// file extension of `path`.
pub fn scan_source(
    path: &Path,
    source: String,
    rules: &RuleSet,
) -> Result<Vec<Finding>, FileScanError> {
    let language = detect_language(path).ok_or_else(|| {
        FileScanError::new(path, FileErrorKind::Parse, "unsupported file type")
    })?;
    let tree = parse_source(path, language, source).map_err(|e| parse_failure(path, e))?;
    let mut findings = analyze_tree(&tree, language, rules, Some(DEFAULT_SUPPRESS_COMMENT), None)
        .map_err(|_| FileScanError::new(path, FileErrorKind::Interrupted, "interrupted"))?;
    findings.sort_by(|a, b| (a.line, a.column, &a.rule_id).cmp(&(b.line, b.column, &b.rule_id)));
    Ok(findings)
}

/// Runs every rule targeting `language` over a parsed tree. Matching gives
/// up with [`Interrupted`] once `budget` expires.
pub fn analyze_tree(
    tree: &SyntaxTree,
    language: Language,
    rules: &RuleSet,
    suppress_comment: Option<&str>,
    budget: Option<&ScanControl>,
) -> Result<Vec<Finding>, Interrupted> {
    let eval = Evaluator::new(tree, language, budget);
    let mut out = Vec::new();
    for rule in rules.for_language(language) {
        debug!(rule_id = %rule.id, file = %tree.path.display(), "Evaluating rule");
        let matches = match &rule.mode {
            RuleMode::Search(formula) => eval.eval(formula)?,
            RuleMode::Taint(spec) => eval_taint(&eval, spec)?,
        };
        for m in apply_uniqueness(matches, rule.uniqueness) {
            let finding = build_finding(rule, tree, &m);
            if let Some(marker) = suppress_comment {
                if tree.line_text(finding.line).contains(marker) {
                    debug!(rule_id = %rule.id, line = finding.line, "Finding suppressed");
                    continue;
                }
            }
            out.push(finding);
        }
    }
    Ok(out)
}

fn apply_uniqueness(matches: Vec<Match<'_>>, uniqueness: Uniqueness) -> Vec<Match<'_>> {
    match uniqueness {
        Uniqueness::PerMatch => matches,
        Uniqueness::Outermost => {
            let spans: Vec<_> = matches.iter().map(|m| m.span).collect();
            matches
                .into_iter()
                .filter(|m| {
                    !spans
                        .iter()
                        .any(|outer| *outer != m.span && outer.contains(&m.span))
                })
                .collect()
        }
    }
}

fn build_finding(rule: &Rule, tree: &SyntaxTree, m: &Match<'_>) -> Finding {
    let bindings: BTreeMap<String, String> = m
        .bindings
        .iter()
        .map(|(name, node)| (name.clone(), tree.text(node).to_string()))
        .collect();
    let line = m.span.start.line;
    let column = m.span.start.column;
    Finding {
        id: Finding::make_id(&rule.id, &tree.path, line, column),
        rule_id: rule.id.clone(),
        file: tree.path.clone(),
        line,
        column,
        end_line: m.span.end.line,
        end_column: m.span.end.column,
        severity: rule.severity,
        message: interpolate(&rule.message, &bindings),
        bindings,
        cwe: rule.metadata.cwe.clone(),
        remediation: rule.metadata.remediation.clone(),
        excerpt: tree.line_text(line).trim().to_string(),
    }
}

/// Replaces `$NAME` with the bound text; unknown names are left as written.
fn interpolate(message: &str, bindings: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(message.len());
    let mut rest = message;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'))
            .unwrap_or(after.len());
        match bindings.get(&after[..len]) {
            Some(text) if len > 0 => out.push_str(text),
            _ => {
                out.push('$');
                out.push_str(&after[..len]);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}
