//! Intra-procedural taint tracking for `mode: taint` rules.
//!
//! Each function body and the module top level are analysed on their own.
//! Assignments and sink matches are replayed in source order: an assignment
//! taints its target variables when its right-hand side contains a source
//! match or a tainted variable outside any sanitizer, and clears them
//! otherwise.

use ir::{NodeKind, Span, SyntaxNode};
use loader::TaintSpec;
use std::collections::HashMap;

use crate::control::Interrupted;
use crate::formula::{dedup_by_span, Evaluator};
use crate::matcher::{merge, Bindings, Match};

pub(crate) fn eval_taint<'t>(
    eval: &Evaluator<'_, 't>,
    spec: &TaintSpec,
) -> Result<Vec<Match<'t>>, Interrupted> {
    let sources = collect(eval, &spec.sources)?;
    if sources.is_empty() {
        return Ok(Vec::new());
    }
    let sinks = collect(eval, &spec.sinks)?;
    if sinks.is_empty() {
        return Ok(Vec::new());
    }
    let sanitizers: Vec<Span> = collect(eval, &spec.sanitizers)?
        .into_iter()
        .map(|m| m.span)
        .collect();

    let root = &eval.tree().root;
    let scopes: Vec<&'t SyntaxNode> = root.preorder().filter(|n| n.kind.is_scope()).collect();
    let analysis = Analysis {
        sources: &sources,
        sanitizers: &sanitizers,
    };
    let mut findings = Vec::new();
    for scope in &scopes {
        let owned: Vec<&Match<'t>> = sinks
            .iter()
            .filter(|sink| innermost_scope(&scopes, &sink.span).is_some_and(|s| std::ptr::eq(s, *scope)))
            .collect();
        if owned.is_empty() {
            continue;
        }
        findings.extend(analysis.run_scope(scope, &owned));
    }
    findings.sort_by_key(|m| (m.span.start_byte, m.span.end_byte));
    Ok(dedup_by_span(findings))
}

fn collect<'t>(
    eval: &Evaluator<'_, 't>,
    formulas: &[loader::Formula],
) -> Result<Vec<Match<'t>>, Interrupted> {
    let mut out = Vec::new();
    for formula in formulas {
        out.extend(eval.eval(formula)?);
    }
    Ok(out)
}

fn innermost_scope<'t>(scopes: &[&'t SyntaxNode], span: &Span) -> Option<&'t SyntaxNode> {
    scopes
        .iter()
        .filter(|s| s.span.contains(span))
        .min_by_key(|s| s.span.end_byte - s.span.start_byte)
        .copied()
}

enum Event<'a, 't> {
    Sink(&'a Match<'t>),
    Assign(&'t SyntaxNode),
}

struct Analysis<'a, 't> {
    sources: &'a [Match<'t>],
    sanitizers: &'a [Span],
}

impl<'a, 't> Analysis<'a, 't> {
    fn run_scope(&self, scope: &'t SyntaxNode, sinks: &[&'a Match<'t>]) -> Vec<Match<'t>> {
        let nodes = scope_nodes(scope);
        let mut events: Vec<(usize, Event<'a, 't>)> = sinks
            .iter()
            .map(|sink| (sink.span.start_byte, Event::Sink(sink)))
            .collect();
        for node in &nodes {
            if node.kind == NodeKind::Assignment && node.children.len() >= 2 {
                // Takes effect once the right-hand side has been evaluated.
                events.push((node.span.end_byte, Event::Assign(node)));
            }
        }
        events.sort_by_key(|(offset, event)| (*offset, matches!(event, Event::Assign(_))));

        let mut tainted: HashMap<String, Bindings<'t>> = HashMap::new();
        let mut findings = Vec::new();
        for (_, event) in events {
            match event {
                Event::Assign(node) => {
                    let rhs = &node.children[node.children.len() - 1];
                    let origin = self.taint_of(&rhs.span, &nodes, &tainted);
                    let augmented = node.value.as_deref().is_some_and(|op| op != "=");
                    for name in targets(&node.children[0]) {
                        match &origin {
                            Some(bindings) => {
                                tainted.insert(name, bindings.clone());
                            }
                            None if !augmented => {
                                tainted.remove(&name);
                            }
                            None => {}
                        }
                    }
                }
                Event::Sink(sink) => {
                    if let Some(origin) = self.taint_of(&sink.span, &nodes, &tainted) {
                        findings.push(Match {
                            span: sink.span,
                            bindings: merge(&sink.bindings, &origin),
                        });
                    }
                }
            }
        }
        findings
    }

    /// Bindings of the source that taints `span`, if any.
    fn taint_of(
        &self,
        span: &Span,
        nodes: &[&'t SyntaxNode],
        tainted: &HashMap<String, Bindings<'t>>,
    ) -> Option<Bindings<'t>> {
        if let Some(source) = self
            .sources
            .iter()
            .find(|s| span.contains(&s.span) && !self.sanitized(&s.span))
        {
            return Some(source.bindings.clone());
        }
        if tainted.is_empty() {
            return None;
        }
        nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Identifier && span.contains(&n.span))
            .filter(|n| !self.sanitized(&n.span))
            .find_map(|n| n.value.as_deref().and_then(|name| tainted.get(name)))
            .cloned()
    }

    fn sanitized(&self, span: &Span) -> bool {
        self.sanitizers.iter().any(|s| s.contains(span))
    }
}

/// Nodes of `scope` in preorder, without nested function bodies. Attribute
/// names and keyword names are left out since they never denote variables.
fn scope_nodes(scope: &SyntaxNode) -> Vec<&SyntaxNode> {
    let mut out = Vec::new();
    let mut stack = vec![scope];
    while let Some(node) = stack.pop() {
        out.push(node);
        let children: &[SyntaxNode] = match node.kind {
            NodeKind::MemberAccess => &node.children[..node.children.len().min(1)],
            NodeKind::KeywordArgument => node.children.get(1..).unwrap_or_default(),
            _ => &node.children,
        };
        for child in children.iter().rev() {
            if child.kind == NodeKind::FunctionDefinition {
                continue;
            }
            stack.push(child);
        }
    }
    out
}

/// Variable names written by an assignment target.
fn targets(target: &SyntaxNode) -> Vec<String> {
    match target.kind {
        NodeKind::Identifier => target.value.iter().cloned().collect(),
        NodeKind::MemberAccess | NodeKind::Call => Vec::new(),
        _ => target
            .preorder()
            .filter(|n| n.kind == NodeKind::Identifier)
            .filter_map(|n| n.value.clone())
            .collect(),
    }
}
