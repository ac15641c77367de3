//! The semgrep-compatible rule format and its compilation.

use parsers::Language;
use patterns::compile_pattern;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::RuleCompilationError;
use crate::schema::compiled::{
    common_metavariables, log_rule_summary, Formula, PatternLeaf, Rule, RuleMetadata, RuleMode,
    Severity, TaintSpec, Term, Uniqueness,
};
use crate::schema::{deserialize_languages, deserialize_one_or_many};

/// Language names accepted for rules that only use `pattern-regex`.
const GENERIC_LANGUAGES: &[&str] = &["generic", "regex", "none"];

#[derive(Debug, Clone, Deserialize)]
pub struct RuleFile {
    pub rules: Vec<SemgrepRule>,
}

#[derive(Debug, Clone, Deserialize)]
/// Subset of rules compatible with Semgrep.
pub struct SemgrepRule {
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub severity: Option<String>,
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "deserialize_languages")]
    pub languages: Option<Vec<String>>,
    pub pattern: Option<String>,
    #[serde(rename = "pattern-regex")]
    pub pattern_regex: Option<String>,
    pub patterns: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-either")]
    pub pattern_either: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-not")]
    pub pattern_not: Option<RawOperand>,
    #[serde(rename = "pattern-inside")]
    pub pattern_inside: Option<RawOperand>,
    #[serde(rename = "pattern-not-inside")]
    pub pattern_not_inside: Option<RawOperand>,
    #[serde(rename = "pattern-sources")]
    pub pattern_sources: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-sinks")]
    pub pattern_sinks: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-sanitizers")]
    pub pattern_sanitizers: Option<Vec<RawTerm>>,
    #[serde(default)]
    pub metadata: RawMetadata,
    #[serde(default)]
    pub options: RawOptions,
}

/// One operator of a formula. Exactly one field must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTerm {
    pub pattern: Option<String>,
    #[serde(rename = "pattern-regex")]
    pub pattern_regex: Option<String>,
    pub patterns: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-either")]
    pub pattern_either: Option<Vec<RawTerm>>,
    #[serde(rename = "pattern-not")]
    pub pattern_not: Option<RawOperand>,
    #[serde(rename = "pattern-inside")]
    pub pattern_inside: Option<RawOperand>,
    #[serde(rename = "pattern-not-inside")]
    pub pattern_not_inside: Option<RawOperand>,
    #[serde(rename = "metavariable-regex")]
    pub metavariable_regex: Option<MetavariableRegex>,
    #[serde(rename = "focus-metavariable")]
    pub focus_metavariable: Option<String>,
}

/// Argument of `pattern-not` / `pattern-inside`: pattern text or a nested formula.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawOperand {
    Text(String),
    Formula(Box<RawTerm>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetavariableRegex {
    pub metavariable: String,
    pub regex: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub cwe: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub owasp: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    pub references: Vec<String>,
    pub remediation: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptions {
    #[serde(default)]
    pub uniqueness: Uniqueness,
}

/// What a raw operator turns into, before position checks.
enum Operator<'a> {
    Pattern(&'a str),
    Regex(&'a str),
    All(&'a [RawTerm]),
    Either(&'a [RawTerm]),
    Not(&'a RawOperand),
    Inside(&'a RawOperand),
    NotInside(&'a RawOperand),
    MetavariableRegex(&'a MetavariableRegex),
    Focus(&'a str),
}

impl Operator<'_> {
    fn name(&self) -> &'static str {
        match self {
            Operator::Pattern(_) => "pattern",
            Operator::Regex(_) => "pattern-regex",
            Operator::All(_) => "patterns",
            Operator::Either(_) => "pattern-either",
            Operator::Not(_) => "pattern-not",
            Operator::Inside(_) => "pattern-inside",
            Operator::NotInside(_) => "pattern-not-inside",
            Operator::MetavariableRegex(_) => "metavariable-regex",
            Operator::Focus(_) => "focus-metavariable",
        }
    }
}

impl RawTerm {
    fn operators(&self) -> Vec<Operator<'_>> {
        let mut ops = Vec::new();
        if let Some(p) = &self.pattern {
            ops.push(Operator::Pattern(p));
        }
        if let Some(r) = &self.pattern_regex {
            ops.push(Operator::Regex(r));
        }
        if let Some(items) = &self.patterns {
            ops.push(Operator::All(items));
        }
        if let Some(items) = &self.pattern_either {
            ops.push(Operator::Either(items));
        }
        if let Some(o) = &self.pattern_not {
            ops.push(Operator::Not(o));
        }
        if let Some(o) = &self.pattern_inside {
            ops.push(Operator::Inside(o));
        }
        if let Some(o) = &self.pattern_not_inside {
            ops.push(Operator::NotInside(o));
        }
        if let Some(m) = &self.metavariable_regex {
            ops.push(Operator::MetavariableRegex(m));
        }
        if let Some(f) = &self.focus_metavariable {
            ops.push(Operator::Focus(f));
        }
        ops
    }
}

impl SemgrepRule {
    /// The search formula written directly on the rule.
    fn top_level(&self) -> RawTerm {
        RawTerm {
            pattern: self.pattern.clone(),
            pattern_regex: self.pattern_regex.clone(),
            patterns: self.patterns.clone(),
            pattern_either: self.pattern_either.clone(),
            pattern_not: self.pattern_not.clone(),
            pattern_inside: self.pattern_inside.clone(),
            pattern_not_inside: self.pattern_not_inside.clone(),
            metavariable_regex: None,
            focus_metavariable: None,
        }
    }
}

struct Ctx<'a> {
    rule_id: &'a str,
    languages: &'a [Language],
    generic: bool,
}

impl Ctx<'_> {
    fn malformed(&self, reason: impl Into<String>) -> RuleCompilationError {
        RuleCompilationError::malformed(self.rule_id, reason)
    }

    fn single<'t>(&self, term: &'t RawTerm, what: &str) -> Result<Operator<'t>, RuleCompilationError> {
        let mut ops = term.operators();
        match ops.len() {
            0 => Err(self.malformed(format!("{what} has no operator"))),
            1 => Ok(ops.remove(0)),
            _ => {
                let names: Vec<&str> = ops.iter().map(Operator::name).collect();
                Err(self.malformed(format!(
                    "{what} must have exactly one operator, found {}",
                    names.join(", ")
                )))
            }
        }
    }

    fn pattern(&self, text: &str) -> Result<Formula, RuleCompilationError> {
        if self.generic {
            return Err(self.malformed(format!(
                "structural pattern `{text}` needs a concrete language"
            )));
        }
        let mut compiled = Vec::with_capacity(self.languages.len());
        for &language in self.languages {
            let pattern =
                compile_pattern(text, language).map_err(|source| RuleCompilationError::Pattern {
                    rule_id: self.rule_id.to_string(),
                    pattern: text.to_string(),
                    source,
                })?;
            compiled.push(pattern);
        }
        Ok(Formula::Pattern(PatternLeaf::new(text.to_string(), compiled)))
    }

    fn regex(&self, raw: &str, anchored: bool) -> Result<Regex, RuleCompilationError> {
        let source = if anchored {
            format!(r"\A(?:{raw})")
        } else {
            raw.to_string()
        };
        RegexBuilder::new(&source)
            .multi_line(true)
            .build()
            .map_err(|source| RuleCompilationError::Regex {
                rule_id: self.rule_id.to_string(),
                regex: raw.to_string(),
                source,
            })
    }

    fn operand(&self, operand: &RawOperand) -> Result<Formula, RuleCompilationError> {
        match operand {
            RawOperand::Text(text) => self.pattern(text),
            RawOperand::Formula(term) => self.formula(term),
        }
    }

    /// Compiles a term in positive position.
    fn formula(&self, term: &RawTerm) -> Result<Formula, RuleCompilationError> {
        match self.single(term, "formula")? {
            Operator::Pattern(text) => self.pattern(text),
            Operator::Regex(raw) => Ok(Formula::Regex(self.regex(raw, false)?)),
            Operator::All(items) => self.conjunction(items),
            Operator::Either(items) => {
                if items.is_empty() {
                    return Err(self.malformed("pattern-either must not be empty"));
                }
                let alternatives = items
                    .iter()
                    .map(|item| self.formula(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Formula::Either(alternatives))
            }
            other => Err(self.malformed(format!(
                "{} is only allowed as an item of `patterns`",
                other.name()
            ))),
        }
    }

    fn conjunction(&self, items: &[RawTerm]) -> Result<Formula, RuleCompilationError> {
        let mut terms = Vec::with_capacity(items.len());
        for item in items {
            let term = match self.single(item, "item of `patterns`")? {
                Operator::Not(o) => Term::Not(self.operand(o)?),
                Operator::Inside(o) => Term::Inside(self.operand(o)?),
                Operator::NotInside(o) => Term::NotInside(self.operand(o)?),
                Operator::MetavariableRegex(m) => Term::MetavariableRegex {
                    metavariable: metavariable_name(&m.metavariable),
                    regex: self.regex(&m.regex, true)?,
                },
                Operator::Focus(name) => Term::Focus(metavariable_name(name)),
                _ => Term::Positive(self.formula(item)?),
            };
            terms.push(term);
        }
        if !terms.iter().any(|t| matches!(t, Term::Positive(_))) {
            return Err(self.malformed("`patterns` needs at least one positive pattern"));
        }
        let formula = Formula::All(terms);
        let bound = formula.bound_metavariables();
        if let Formula::All(terms) = &formula {
            for term in terms {
                let (name, context) = match term {
                    Term::MetavariableRegex { metavariable, .. } => {
                        (metavariable, "metavariable-regex")
                    }
                    Term::Focus(name) => (name, "focus-metavariable"),
                    _ => continue,
                };
                if !bound.contains(name) {
                    return Err(RuleCompilationError::UnboundMetavariable {
                        rule_id: self.rule_id.to_string(),
                        name: name.clone(),
                        context,
                    });
                }
            }
        }
        Ok(formula)
    }

    fn taint_side(
        &self,
        items: Option<&Vec<RawTerm>>,
        what: &str,
        required: bool,
    ) -> Result<Vec<Formula>, RuleCompilationError> {
        let items = items.map(Vec::as_slice).unwrap_or_default();
        if required && items.is_empty() {
            return Err(self.malformed(format!("taint rule needs at least one entry in {what}")));
        }
        items.iter().map(|item| self.formula(item)).collect()
    }
}

fn metavariable_name(raw: &str) -> String {
    raw.trim().trim_start_matches('$').to_string()
}

/// `$NAME` references in a message template.
pub(crate) fn message_metavariables(message: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let bytes = message.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len()
                && (bytes[end].is_ascii_uppercase() || bytes[end].is_ascii_digit() || bytes[end] == b'_')
            {
                end += 1;
            }
            if end > start && !bytes[start].is_ascii_digit() {
                names.insert(message[start..end].to_string());
            }
            i = end.max(start);
        } else {
            i += 1;
        }
    }
    names
}

fn resolve_languages(
    rule_id: &str,
    names: Option<&[String]>,
) -> Result<(Vec<Language>, bool), RuleCompilationError> {
    let names = names.unwrap_or_default();
    if names.is_empty() {
        return Err(RuleCompilationError::malformed(rule_id, "missing `languages`"));
    }
    let mut languages = Vec::new();
    let mut generic = false;
    for name in names {
        if GENERIC_LANGUAGES.contains(&name.trim().to_lowercase().as_str()) {
            generic = true;
            continue;
        }
        let language =
            Language::from_name(name).ok_or_else(|| RuleCompilationError::UnknownLanguage {
                rule_id: rule_id.to_string(),
                value: name.clone(),
            })?;
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    if generic {
        languages = Language::ALL.to_vec();
    }
    Ok((languages, generic))
}

pub(crate) fn compile_semgrep_rule(
    raw: &SemgrepRule,
    file_path: Option<&Path>,
) -> Result<Rule, RuleCompilationError> {
    let rule_id = raw.id.trim();
    if rule_id.is_empty() {
        return Err(RuleCompilationError::malformed("<unnamed>", "empty rule id"));
    }
    let severity = match raw.severity.as_deref() {
        None => Severity::Warning,
        Some(value) => value
            .parse()
            .map_err(|_| RuleCompilationError::UnknownSeverity {
                rule_id: rule_id.to_string(),
                value: value.to_string(),
            })?,
    };
    let (languages, generic) = resolve_languages(rule_id, raw.languages.as_deref())?;
    let ctx = Ctx {
        rule_id,
        languages: &languages,
        generic,
    };

    let top = raw.top_level();
    let mode = match raw.mode.as_deref().map(str::trim) {
        None | Some("search") => {
            if raw.pattern_sources.is_some() || raw.pattern_sinks.is_some() {
                return Err(ctx.malformed("pattern-sources/pattern-sinks require `mode: taint`"));
            }
            RuleMode::Search(ctx.formula(&top)?)
        }
        Some("taint") => {
            if !top.operators().is_empty() {
                return Err(ctx.malformed("taint rules take no top-level pattern operators"));
            }
            RuleMode::Taint(TaintSpec {
                sources: ctx.taint_side(raw.pattern_sources.as_ref(), "pattern-sources", true)?,
                sinks: ctx.taint_side(raw.pattern_sinks.as_ref(), "pattern-sinks", true)?,
                sanitizers: ctx.taint_side(
                    raw.pattern_sanitizers.as_ref(),
                    "pattern-sanitizers",
                    false,
                )?,
            })
        }
        Some(other) => return Err(ctx.malformed(format!("unknown mode '{other}'"))),
    };

    let bound = match &mode {
        RuleMode::Search(formula) => formula.bound_metavariables(),
        RuleMode::Taint(spec) => common_metavariables(&spec.sources)
            .into_iter()
            .chain(common_metavariables(&spec.sinks))
            .collect(),
    };
    if let Some(name) = message_metavariables(&raw.message)
        .into_iter()
        .find(|name| !bound.contains(name))
    {
        return Err(RuleCompilationError::UnboundMetavariable {
            rule_id: rule_id.to_string(),
            name,
            context: "message",
        });
    }

    let rule = Rule {
        id: rule_id.to_string(),
        message: raw.message.trim().to_string(),
        severity,
        languages,
        mode,
        metadata: RuleMetadata {
            cwe: raw.metadata.cwe.clone(),
            owasp: raw.metadata.owasp.clone(),
            references: raw.metadata.references.clone(),
            remediation: raw.metadata.remediation.clone(),
            category: raw.metadata.category.clone(),
        },
        uniqueness: raw.options.uniqueness,
        source_file: file_path.map(Path::to_path_buf),
    };
    log_rule_summary(&rule);
    Ok(rule)
}
