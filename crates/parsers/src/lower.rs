//! Lowering of tree-sitter concrete syntax into [`ir::SyntaxNode`]s.
//!
//! Sources and pattern snippets go through the same lowering, so every
//! normalisation here is an equivalence the matcher gets for free.

use ir::{NodeKind, Position, Span, SyntaxNode};
use tree_sitter::Node;

/// What to do with a grammar node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lowering {
    Keep(NodeKind),
    /// Replaced by its only named child; kept as `Other` when it has several.
    Transparent,
    /// Value is the literal content without quotes or prefixes; embedded
    /// expressions of f-strings and template literals become children.
    StringLiteral,
    Skip,
}

pub(crate) struct Grammar {
    pub language: fn() -> tree_sitter::Language,
    pub classify: fn(&str) -> Lowering,
}

/// Anonymous tokens that never carry meaning for matching.
const PUNCTUATION: &[&str] = &["(", ")", "[", "]", "{", "}", ",", ";", ":", "."];

/// Wrappers around the expressions embedded in a string.
const INTERPOLATIONS: &[&str] = &["interpolation", "template_substitution"];

pub(crate) fn lower(node: Node<'_>, src: &str, grammar: &Grammar) -> Option<SyntaxNode> {
    match (grammar.classify)(node.kind()) {
        Lowering::Skip => None,
        Lowering::StringLiteral => Some(
            SyntaxNode::new(NodeKind::StringLiteral, span_of(node))
                .with_value(string_content(text(node, src)))
                .with_children(interpolations(node, src, grammar)),
        ),
        Lowering::Transparent => {
            let mut children = lower_children(node, src, grammar);
            if children.len() == 1 {
                children.pop()
            } else {
                Some(build(
                    NodeKind::Other(node.kind().to_string()),
                    node,
                    src,
                    children,
                ))
            }
        }
        Lowering::Keep(kind) => {
            let children = lower_children(node, src, grammar);
            Some(build(kind, node, src, children))
        }
    }
}

fn lower_children(node: Node<'_>, src: &str, grammar: &Grammar) -> Vec<SyntaxNode> {
    let mut cursor = node.walk();
    let named: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    named
        .into_iter()
        .filter_map(|child| lower(child, src, grammar))
        .collect()
}

fn interpolations(node: Node<'_>, src: &str, grammar: &Grammar) -> Vec<SyntaxNode> {
    let mut cursor = node.walk();
    let wrappers: Vec<Node<'_>> = node
        .named_children(&mut cursor)
        .filter(|child| INTERPOLATIONS.contains(&child.kind()))
        .collect();
    wrappers
        .into_iter()
        .filter_map(|wrapper| {
            let mut cursor = wrapper.walk();
            let expression = wrapper.named_children(&mut cursor).next();
            expression.and_then(|e| lower(e, src, grammar))
        })
        .collect()
}

fn build(kind: NodeKind, node: Node<'_>, src: &str, children: Vec<SyntaxNode>) -> SyntaxNode {
    let value = if node.child_count() == 0 {
        Some(text(node, src).to_string())
    } else {
        operator_text(node, src)
    };
    let mut out = SyntaxNode::new(kind, span_of(node)).with_children(children);
    out.value = value;
    out
}

/// Keywords and operators of `node`, e.g. `+`, `not in`, `return`.
fn operator_text(node: Node<'_>, src: &str) -> Option<String> {
    let mut cursor = node.walk();
    let ops: Vec<&str> = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| text(c, src))
        .filter(|t| !t.trim().is_empty() && !PUNCTUATION.contains(t))
        .collect();
    if ops.is_empty() {
        None
    } else {
        Some(ops.join(" "))
    }
}

fn text<'s>(node: Node<'_>, src: &'s str) -> &'s str {
    node.utf8_text(src.as_bytes()).unwrap_or_default()
}

pub(crate) fn span_of(node: Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    Span {
        start: Position::new(start.row + 1, start.column + 1),
        end: Position::new(end.row + 1, end.column + 1),
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// Strips string prefixes (`r`, `b`, `f`, ...) and the surrounding quotes.
pub(crate) fn string_content(raw: &str) -> String {
    let body = raw.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    for quote in ["\"\"\"", "'''", "\"", "'", "`"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return body[quote.len()..body.len() - quote.len()].to_string();
        }
    }
    body.to_string()
}

/// First ERROR or MISSING node in preorder, if the tree has any.
pub(crate) fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    Some(root)
}
