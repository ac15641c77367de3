//! Structural matching of compiled patterns against syntax trees.
//!
//! One recursive matcher handles every pattern node kind. Children are matched
//! positionally; an ellipsis consumes any run of siblings and every split is
//! explored. Results of sequence matching are memoised on the pattern
//! position, the tree slice and the bindings already fixed for the remaining
//! pattern, which keeps ellipsis backtracking polynomial.

use ir::{NodeKind, Span, SyntaxNode};
use patterns::{Pattern, PatternKind, PatternNode, PatternRoot};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::control::{Interrupted, ScanControl};

/// Metavariable name to the subtree it matched.
pub type Bindings<'t> = BTreeMap<String, &'t SyntaxNode>;

#[derive(Debug, Clone)]
pub struct Match<'t> {
    pub span: Span,
    pub bindings: Bindings<'t>,
}

type Env<'p, 't> = BTreeMap<&'p str, &'t SyntaxNode>;
type Delta<'p, 't> = Vec<(&'p str, &'t SyntaxNode)>;
/// Already-bound metavariables relevant to a sub-match, by node address.
type Fingerprint<'p> = Vec<(&'p str, usize)>;

#[derive(Debug, PartialEq, Eq, Hash)]
struct MemoKey<'p> {
    parent: usize,
    index: usize,
    container: usize,
    start: usize,
    end: usize,
    bound: Fingerprint<'p>,
}

/// Pattern id used for the top-level statement sequence.
const ROOT_SEQUENCE: usize = usize::MAX;
/// Matching steps between two checks of the file time limit.
const CHECK_INTERVAL: usize = 1024;

/// All match locations of `pattern` in the tree rooted at `root`, in
/// preorder. Several binding sets at one location collapse into the first.
///
/// ```
/// use parsers::{parse_source, Language};
/// use patterns::compile_pattern;
/// use std::path::Path;
///
/// let tree = parse_source(Path::new("a.py"), Language::Python, "f(a, a)\nf(a, b)\n".into()).unwrap();
/// let pattern = compile_pattern("f($X, $X)", Language::Python).unwrap();
/// let matches = engine::match_pattern(&tree.root, &pattern);
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].span.start.line, 1);
/// ```
pub fn match_pattern<'t>(root: &'t SyntaxNode, pattern: &Pattern) -> Vec<Match<'t>> {
    find_matches(root, pattern, None).unwrap_or_default()
}

pub(crate) fn find_matches<'t>(
    root: &'t SyntaxNode,
    pattern: &Pattern,
    control: Option<&ScanControl>,
) -> Result<Vec<Match<'t>>, Interrupted> {
    let mut matcher = Matcher::new(control);
    let mut out = Vec::new();
    let empty = Env::new();
    for (visited, node) in root.preorder().enumerate() {
        if visited % CHECK_INTERVAL == 0 && control.is_some_and(ScanControl::should_stop) {
            return Err(Interrupted);
        }
        match &pattern.root {
            PatternRoot::Expr(p) if p.is_ellipsis() => break,
            PatternRoot::Expr(p) => {
                if let Some(env) = matcher.match_node(p, node, &empty).into_iter().next() {
                    out.push(Match {
                        span: node.span,
                        bindings: export(env),
                    });
                }
            }
            PatternRoot::Sequence(pats) => {
                if node.kind.is_statement_container() {
                    matcher.match_statements(pats, node, &mut out);
                }
            }
        }
        if matcher.interrupted {
            return Err(Interrupted);
        }
    }
    Ok(out)
}

struct Matcher<'p, 't, 'c> {
    control: Option<&'c ScanControl>,
    memo: HashMap<MemoKey<'p>, Vec<Delta<'p, 't>>>,
    steps: usize,
    interrupted: bool,
}

impl<'p, 't, 'c> Matcher<'p, 't, 'c> {
    fn new(control: Option<&'c ScanControl>) -> Self {
        Self {
            control,
            memo: HashMap::new(),
            steps: 0,
            interrupted: false,
        }
    }

    /// Counts a step; true once the scan asked to stop.
    fn tick(&mut self) -> bool {
        if self.interrupted {
            return true;
        }
        self.steps += 1;
        if self.steps % CHECK_INTERVAL == 0 && self.control.is_some_and(ScanControl::should_stop)
        {
            self.interrupted = true;
        }
        self.interrupted
    }

    fn match_node(
        &mut self,
        p: &'p PatternNode,
        n: &'t SyntaxNode,
        env: &Env<'p, 't>,
    ) -> Vec<Env<'p, 't>> {
        if self.tick() {
            return Vec::new();
        }
        match &p.kind {
            PatternKind::Metavariable(name) => match env.get(name.as_str()) {
                Some(bound) if bound.structurally_eq(n) => vec![env.clone()],
                Some(_) => Vec::new(),
                None => {
                    let mut next = env.clone();
                    next.insert(name.as_str(), n);
                    vec![next]
                }
            },
            PatternKind::Ellipsis => vec![env.clone()],
            PatternKind::AnyString => {
                if n.kind == NodeKind::StringLiteral {
                    vec![env.clone()]
                } else {
                    Vec::new()
                }
            }
            PatternKind::Node {
                kind,
                value,
                children,
            } => {
                if *kind != n.kind || *value != n.value {
                    return Vec::new();
                }
                if children.is_empty() {
                    return if n.children.is_empty() {
                        vec![env.clone()]
                    } else {
                        Vec::new()
                    };
                }
                self.match_seq(children, p.id, 0, n, 0, n.children.len(), env)
            }
        }
    }

    /// Matches `pats[i..]` against `container.children[start..end]`.
    #[allow(clippy::too_many_arguments)]
    fn match_seq(
        &mut self,
        pats: &'p [PatternNode],
        parent: usize,
        i: usize,
        container: &'t SyntaxNode,
        start: usize,
        end: usize,
        env: &Env<'p, 't>,
    ) -> Vec<Env<'p, 't>> {
        if self.tick() {
            return Vec::new();
        }
        let remaining = &pats[i..];
        if remaining.is_empty() {
            return if start == end {
                vec![env.clone()]
            } else {
                Vec::new()
            };
        }
        let required = remaining.iter().filter(|p| !p.is_ellipsis()).count();
        if required > end - start {
            return Vec::new();
        }

        let key = MemoKey {
            parent,
            index: i,
            container: addr(container),
            start,
            end,
            bound: fingerprint(remaining, env),
        };
        if let Some(deltas) = self.memo.get(&key) {
            return apply(env, deltas);
        }

        let p = &pats[i];
        let mut out = Vec::new();
        if p.is_ellipsis() {
            for next in start..=end {
                out.extend(self.match_seq(pats, parent, i + 1, container, next, end, env));
            }
        } else {
            for matched in self.match_node(p, &container.children[start], env) {
                out.extend(self.match_seq(
                    pats,
                    parent,
                    i + 1,
                    container,
                    start + 1,
                    end,
                    &matched,
                ));
            }
        }
        dedup_envs(&mut out);

        if !self.interrupted {
            let deltas = out.iter().map(|r| delta(r, env)).collect();
            self.memo.insert(key, deltas);
        }
        out
    }

    /// Tries a statement-sequence pattern against every run of statements
    /// of `container`. Leading and trailing ellipses do not widen the range.
    fn match_statements(
        &mut self,
        pats: &'p [PatternNode],
        container: &'t SyntaxNode,
        out: &mut Vec<Match<'t>>,
    ) {
        let first = pats.iter().position(|p| !p.is_ellipsis());
        let last = pats.iter().rposition(|p| !p.is_ellipsis());
        let (Some(first), Some(last)) = (first, last) else {
            return;
        };
        let core = &pats[first..=last];
        let children = &container.children;
        let empty = Env::new();
        for j in 0..children.len() {
            if self.match_node(&core[0], &children[j], &empty).is_empty() {
                continue;
            }
            for k in (j + 1)..=children.len() {
                if self
                    .match_node(&core[core.len() - 1], &children[k - 1], &empty)
                    .is_empty()
                {
                    continue;
                }
                let envs = self.match_seq(core, ROOT_SEQUENCE, 0, container, j, k, &empty);
                if let Some(env) = envs.into_iter().next() {
                    out.push(Match {
                        span: children[j].span.cover(&children[k - 1].span),
                        bindings: export(env),
                    });
                }
                if self.interrupted {
                    return;
                }
            }
        }
    }
}

/// Whether two binding sets agree on every metavariable they share.
pub(crate) fn compatible(a: &Bindings<'_>, b: &Bindings<'_>) -> bool {
    a.iter().all(|(name, node)| {
        b.get(name)
            .map_or(true, |other| other.structurally_eq(node))
    })
}

pub(crate) fn merge<'t>(a: &Bindings<'t>, b: &Bindings<'t>) -> Bindings<'t> {
    let mut merged = a.clone();
    for (name, node) in b {
        merged.entry(name.clone()).or_insert(node);
    }
    merged
}

fn addr(node: &SyntaxNode) -> usize {
    node as *const SyntaxNode as usize
}

fn fingerprint<'p>(pats: &'p [PatternNode], env: &Env<'p, '_>) -> Fingerprint<'p> {
    let names: BTreeSet<&'p str> = pats
        .iter()
        .flat_map(|p| p.metavariables.iter().map(String::as_str))
        .collect();
    names
        .into_iter()
        .filter_map(|name| env.get(name).map(|node| (name, addr(node))))
        .collect()
}

fn delta<'p, 't>(result: &Env<'p, 't>, base: &Env<'p, 't>) -> Delta<'p, 't> {
    result
        .iter()
        .filter(|(name, _)| !base.contains_key(*name))
        .map(|(name, node)| (*name, *node))
        .collect()
}

fn apply<'p, 't>(env: &Env<'p, 't>, deltas: &[Delta<'p, 't>]) -> Vec<Env<'p, 't>> {
    deltas
        .iter()
        .map(|d| {
            let mut next = env.clone();
            next.extend(d.iter().copied());
            next
        })
        .collect()
}

fn dedup_envs(envs: &mut Vec<Env<'_, '_>>) {
    let mut seen = HashSet::new();
    envs.retain(|env| {
        let key: Vec<(&str, usize)> = env.iter().map(|(name, node)| (*name, addr(node))).collect();
        seen.insert(key)
    });
}

fn export<'t>(env: Env<'_, 't>) -> Bindings<'t> {
    env.into_iter()
        .map(|(name, node)| (name.to_string(), node))
        .collect()
}
