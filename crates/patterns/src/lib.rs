//! Pattern language compiler.
//!
//! Pattern text is written in the target language plus three extensions:
//! `$NAME` metavariables, `...` ellipses and the `"..."` wildcard string.
//! [`compile_pattern`] rewrites the extensions into placeholder identifiers,
//! parses the result with the same parser used for sources and converts the
//! lowered tree into [`PatternNode`]s.
//!
//! ```
//! use parsers::Language;
//! use patterns::{compile_pattern, PatternRoot};
//!
//! let pattern = compile_pattern("$CURSOR.execute($QUERY + $INPUT)", Language::Python).unwrap();
//! assert!(matches!(pattern.root, PatternRoot::Expr(_)));
//! assert_eq!(pattern.metavariables().len(), 3);
//! ```

use ir::{NodeKind, SyntaxNode};
use parsers::{parse_snippet, Language, ParseError};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

pub mod placeholder;

use placeholder::{PlaceholderError, ELLIPSIS, METAVAR_PREFIX};

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("invalid metavariable at offset {offset}: names are `$` followed by uppercase letters, digits or `_`")]
    InvalidMetavariable { offset: usize },
    #[error("pattern does not parse as {language}: line {line}, column {column}")]
    Syntax {
        language: Language,
        line: usize,
        column: usize,
    },
    #[error(transparent)]
    Parser(ParseError),
}

impl From<PlaceholderError> for PatternError {
    fn from(err: PlaceholderError) -> Self {
        match err {
            PlaceholderError::InvalidMetavariable { offset } => {
                PatternError::InvalidMetavariable { offset }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    /// Binds any single subtree.
    Metavariable(String),
    /// Zero or more consecutive siblings.
    Ellipsis,
    /// Any string literal.
    AnyString,
    /// Literal node: kind and value must be equal, children match in order.
    Node {
        kind: NodeKind,
        value: Option<String>,
        children: Vec<PatternNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternNode {
    /// Preorder index within the owning [`Pattern`].
    pub id: usize,
    pub kind: PatternKind,
    /// Metavariables bound anywhere in this subtree, sorted.
    pub metavariables: Vec<String>,
}

impl PatternNode {
    fn new(kind: PatternKind) -> Self {
        let mut metavariables = BTreeSet::new();
        match &kind {
            PatternKind::Metavariable(name) => {
                metavariables.insert(name.clone());
            }
            PatternKind::Node { children, .. } => {
                for child in children {
                    metavariables.extend(child.metavariables.iter().cloned());
                }
            }
            PatternKind::Ellipsis | PatternKind::AnyString => {}
        }
        Self {
            id: 0,
            kind,
            metavariables: metavariables.into_iter().collect(),
        }
    }

    pub fn is_ellipsis(&self) -> bool {
        matches!(self.kind, PatternKind::Ellipsis)
    }

    pub fn children(&self) -> &[PatternNode] {
        match &self.kind {
            PatternKind::Node { children, .. } => children,
            _ => &[],
        }
    }
}

/// Where a pattern is anchored in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PatternRoot {
    /// A single expression or statement, tried at every node.
    Expr(PatternNode),
    /// Several statements, tried against every run of sibling statements.
    Sequence(Vec<PatternNode>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Pattern {
    pub text: String,
    pub language: Language,
    pub root: PatternRoot,
    node_count: usize,
}

impl Pattern {
    /// Number of pattern nodes; ids are `0..node_count()`.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn metavariables(&self) -> BTreeSet<&str> {
        let nodes: &[PatternNode] = match &self.root {
            PatternRoot::Expr(node) => std::slice::from_ref(node),
            PatternRoot::Sequence(nodes) => nodes,
        };
        nodes
            .iter()
            .flat_map(|n| n.metavariables.iter().map(String::as_str))
            .collect()
    }
}

/// Compiles `text` for `language`. Deterministic: equal inputs give equal
/// patterns, ids included.
pub fn compile_pattern(text: &str, language: Language) -> Result<Pattern, PatternError> {
    if text.trim().is_empty() {
        return Err(PatternError::Empty);
    }
    let rewritten = placeholder::rewrite(text)?;
    let module = parse_snippet(language, &rewritten).map_err(|err| match err {
        ParseError::Syntax { line, column, .. } => PatternError::Syntax {
            language,
            line,
            column,
        },
        other => PatternError::Parser(other),
    })?;

    let mut statements: Vec<PatternNode> = module.children.iter().map(convert).collect();
    let mut next = 0usize;
    let root = match statements.len() {
        0 => return Err(PatternError::Empty),
        1 => {
            let mut node = statements.remove(0);
            assign_ids(&mut node, &mut next);
            PatternRoot::Expr(node)
        }
        _ => {
            for node in &mut statements {
                assign_ids(node, &mut next);
            }
            PatternRoot::Sequence(statements)
        }
    };
    debug!(pattern = text, %language, nodes = next, "Compiled pattern");
    Ok(Pattern {
        text: text.to_string(),
        language,
        root,
        node_count: next,
    })
}

fn convert(node: &SyntaxNode) -> PatternNode {
    if node.kind == NodeKind::Identifier {
        if let Some(value) = node.value.as_deref() {
            if value == ELLIPSIS {
                return PatternNode::new(PatternKind::Ellipsis);
            }
            if let Some(name) = value.strip_prefix(METAVAR_PREFIX) {
                return PatternNode::new(PatternKind::Metavariable(name.to_string()));
            }
        }
    }
    if node.kind == NodeKind::StringLiteral && node.value.as_deref() == Some("...") {
        return PatternNode::new(PatternKind::AnyString);
    }
    PatternNode::new(PatternKind::Node {
        kind: node.kind.clone(),
        value: node.value.clone(),
        children: node.children.iter().map(convert).collect(),
    })
}

fn assign_ids(node: &mut PatternNode, next: &mut usize) {
    node.id = *next;
    *next += 1;
    if let PatternKind::Node { children, .. } = &mut node.kind {
        for child in children {
            assign_ids(child, next);
        }
    }
}
