use parsers::Language;
use patterns::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

use crate::error::RuleCompilationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
/// Severity associated with a rule or finding.
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// How overlapping matches of one rule are reported.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Uniqueness {
    /// Every distinct match range is a finding.
    #[default]
    PerMatch,
    /// Matches strictly nested inside another match of the rule are dropped.
    Outermost,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RuleMetadata {
    pub cwe: Vec<String>,
    pub owasp: Vec<String>,
    pub references: Vec<String>,
    pub remediation: Option<String>,
    pub category: Option<String>,
}

/// Structural pattern compiled once per language the rule targets.
#[derive(Debug, Clone)]
pub struct PatternLeaf {
    pub text: String,
    patterns: Vec<Pattern>,
}

impl PatternLeaf {
    pub(crate) fn new(text: String, patterns: Vec<Pattern>) -> Self {
        Self { text, patterns }
    }

    pub fn for_language(&self, language: Language) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.language == language)
    }

    fn metavariables(&self) -> BTreeSet<String> {
        self.patterns
            .iter()
            .flat_map(|p| p.metavariables().into_iter().map(str::to_string))
            .collect()
    }
}

/// Boolean combination of pattern matches, evaluated over match ranges.
#[derive(Debug, Clone)]
pub enum Formula {
    Pattern(PatternLeaf),
    /// `pattern-regex`: matches over the raw source, binds nothing.
    Regex(Regex),
    /// `pattern-either`.
    Either(Vec<Formula>),
    /// `patterns`.
    All(Vec<Term>),
}

/// Element of a `patterns` conjunction.
#[derive(Debug, Clone)]
pub enum Term {
    Positive(Formula),
    Inside(Formula),
    Not(Formula),
    NotInside(Formula),
    MetavariableRegex { metavariable: String, regex: Regex },
    Focus(String),
}

impl Formula {
    /// Metavariables every match of this formula binds. An alternative of a
    /// `pattern-either` only contributes names all its siblings bind too.
    pub fn bound_metavariables(&self) -> BTreeSet<String> {
        match self {
            Formula::Pattern(leaf) => leaf.metavariables(),
            Formula::Regex(_) => BTreeSet::new(),
            Formula::Either(alternatives) => common_metavariables(alternatives),
            Formula::All(terms) => terms
                .iter()
                .flat_map(|term| match term {
                    Term::Positive(f) | Term::Inside(f) => f.bound_metavariables(),
                    _ => BTreeSet::new(),
                })
                .collect(),
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Formula::Pattern(_) | Formula::Regex(_) => 1,
            Formula::Either(alternatives) => alternatives.iter().map(Formula::leaf_count).sum(),
            Formula::All(terms) => terms
                .iter()
                .map(|term| match term {
                    Term::Positive(f) | Term::Inside(f) | Term::Not(f) | Term::NotInside(f) => {
                        f.leaf_count()
                    }
                    Term::MetavariableRegex { .. } | Term::Focus(_) => 0,
                })
                .sum(),
        }
    }
}

/// Metavariables bound by every formula of `formulas`.
pub(crate) fn common_metavariables(formulas: &[Formula]) -> BTreeSet<String> {
    let mut sets = formulas.iter().map(Formula::bound_metavariables);
    let first = sets.next().unwrap_or_default();
    sets.fold(first, |acc, set| acc.intersection(&set).cloned().collect())
}

/// Sources, sinks and sanitizers of a `mode: taint` rule.
#[derive(Debug, Clone)]
pub struct TaintSpec {
    pub sources: Vec<Formula>,
    pub sinks: Vec<Formula>,
    pub sanitizers: Vec<Formula>,
}

#[derive(Debug, Clone)]
pub enum RuleMode {
    Search(Formula),
    Taint(TaintSpec),
}

#[derive(Debug, Clone)]
/// Representation ready for rule execution.
pub struct Rule {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub languages: Vec<Language>,
    pub mode: RuleMode,
    pub metadata: RuleMetadata,
    pub uniqueness: Uniqueness,
    pub source_file: Option<PathBuf>,
}

impl Rule {
    pub fn applies_to(&self, language: Language) -> bool {
        self.languages.contains(&language)
    }
}

/// Immutable collection of compiled rules, shared read-only by the workers.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Builds a set, rejecting duplicate ids.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleCompilationError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleCompilationError::DuplicateId(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Languages targeted by at least one rule.
    pub fn languages(&self) -> BTreeSet<Language> {
        self.rules
            .iter()
            .flat_map(|r| r.languages.iter().copied())
            .collect()
    }

    pub fn for_language(&self, language: Language) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.applies_to(language))
    }
}

pub(crate) fn log_rule_summary(rule: &Rule) {
    if !tracing::level_enabled!(tracing::Level::DEBUG) {
        return;
    }
    let languages: Vec<&str> = rule.languages.iter().map(|l| l.name()).collect();
    match &rule.mode {
        RuleMode::Search(formula) => debug!(
            rule_id = %rule.id,
            mode = "search",
            languages = ?languages,
            leaves = formula.leaf_count(),
            severity = %rule.severity,
            file = ?rule.source_file,
            "compiled rule"
        ),
        RuleMode::Taint(spec) => debug!(
            rule_id = %rule.id,
            mode = "taint",
            languages = ?languages,
            sources = spec.sources.len(),
            sinks = spec.sinks.len(),
            sanitizers = spec.sanitizers.len(),
            severity = %rule.severity,
            file = ?rule.source_file,
            "compiled taint rule"
        ),
    }
}
