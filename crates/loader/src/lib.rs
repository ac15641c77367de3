//! Loads semgrep-style YAML rules and compiles them into an immutable
//! [`RuleSet`].
//!
//! A rule file holds a top-level `rules:` list. Each rule is either a search
//! rule (a formula built from `pattern`, `patterns`, `pattern-either`, ...)
//! or a `mode: taint` rule with sources, sinks and sanitizers. Every pattern
//! is compiled for each language the rule lists; any failure aborts loading.

use std::fs;
use std::path::Path;
use tracing::{debug, info};

mod error;
pub mod schema;
mod walk;

pub use error::RuleCompilationError;
pub use schema::compiled::{
    Formula, PatternLeaf, Rule, RuleMetadata, RuleMode, RuleSet, Severity, TaintSpec, Term,
    Uniqueness,
};
pub use walk::visit;

use schema::semgrep::{compile_semgrep_rule, RuleFile};

/// Loads a rule file, or every `.yaml`/`.yml` file below a directory.
///
/// # Example
/// ```no_run
/// use loader::load_rules;
/// let rules = load_rules(std::path::Path::new("rules")).unwrap();
/// assert!(!rules.is_empty());
/// ```
pub fn load_rules(path: &Path) -> Result<RuleSet, RuleCompilationError> {
    let metadata = fs::metadata(path).map_err(|source| RuleCompilationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut files = Vec::new();
    if metadata.is_file() {
        files.push(path.to_path_buf());
    } else {
        let excl = |p: &Path| {
            p.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name == ".git")
                .unwrap_or(false)
        };
        visit(path, &excl, &mut |candidate: &Path| -> std::io::Result<()> {
            if is_rule_file(candidate) {
                debug!(file = %candidate.display(), "Discovered rule file");
                files.push(candidate.to_path_buf());
            } else {
                debug!(file = %candidate.display(), "Skipping non-rule file");
            }
            Ok(())
        })
        .map_err(|source| RuleCompilationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        files.sort();
    }

    let mut rules = Vec::new();
    for file in &files {
        let data = fs::read_to_string(file).map_err(|source| RuleCompilationError::Io {
            path: file.clone(),
            source,
        })?;
        rules.extend(parse_rule_file(&data, Some(file))?);
    }
    let set = RuleSet::new(rules)?;
    info!(rules = set.len(), files = files.len(), "Rules loaded");
    Ok(set)
}

/// Compiles rules from YAML text. `origin` is only used in messages.
pub fn load_rules_from_str(
    yaml: &str,
    origin: Option<&Path>,
) -> Result<RuleSet, RuleCompilationError> {
    RuleSet::new(parse_rule_file(yaml, origin)?)
}

fn parse_rule_file(yaml: &str, origin: Option<&Path>) -> Result<Vec<Rule>, RuleCompilationError> {
    let display = origin.unwrap_or(Path::new("<memory>"));
    let doc: RuleFile =
        serde_yaml::from_str(yaml).map_err(|source| RuleCompilationError::Yaml {
            path: display.to_path_buf(),
            source,
        })?;
    doc.rules
        .iter()
        .map(|raw| compile_semgrep_rule(raw, origin).map_err(|e| e.in_file(display)))
        .collect()
}

fn is_rule_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
