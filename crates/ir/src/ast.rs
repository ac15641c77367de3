//! Generic syntax tree produced by the parsers.
//!
//! Every language is lowered into the same closed set of [`NodeKind`]s so
//! that rules and the matcher never depend on grammar-specific node names.
//! Kinds without a generic category keep their grammar name in
//! [`NodeKind::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// 1-based line and column.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl Span {
    /// Whether `other` lies entirely within `self`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(&self, other: &Span) -> Span {
        let (start, start_byte) = if other.start_byte < self.start_byte {
            (other.start, other.start_byte)
        } else {
            (self.start, self.start_byte)
        };
        let (end, end_byte) = if other.end_byte > self.end_byte {
            (other.end, other.end_byte)
        } else {
            (self.end, self.end_byte)
        };
        Span {
            start,
            end,
            start_byte,
            end_byte,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    Block,
    Call,
    Arguments,
    KeywordArgument,
    MemberAccess,
    Identifier,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    NullLiteral,
    BinaryExpression,
    UnaryExpression,
    Assignment,
    FunctionDefinition,
    ClassDefinition,
    Return,
    If,
    Loop,
    Import,
    /// Grammar-specific kind with no generic category.
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::Block => "Block",
            NodeKind::Call => "Call",
            NodeKind::Arguments => "Arguments",
            NodeKind::KeywordArgument => "KeywordArgument",
            NodeKind::MemberAccess => "MemberAccess",
            NodeKind::Identifier => "Identifier",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::NumberLiteral => "NumberLiteral",
            NodeKind::BooleanLiteral => "BooleanLiteral",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::UnaryExpression => "UnaryExpression",
            NodeKind::Assignment => "Assignment",
            NodeKind::FunctionDefinition => "FunctionDefinition",
            NodeKind::ClassDefinition => "ClassDefinition",
            NodeKind::Return => "Return",
            NodeKind::If => "If",
            NodeKind::Loop => "Loop",
            NodeKind::Import => "Import",
            NodeKind::Other(name) => name,
        }
    }

    /// Kinds whose children form a statement sequence.
    pub fn is_statement_container(&self) -> bool {
        matches!(self, NodeKind::Module | NodeKind::Block)
    }

    /// Kinds that open a new intra-procedural scope.
    pub fn is_scope(&self) -> bool {
        matches!(self, NodeKind::Module | NodeKind::FunctionDefinition)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Preorder index of the node within its tree.
    pub id: usize,
    pub kind: NodeKind,
    /// Identifier name, normalised literal value or operator text.
    pub value: Option<String>,
    pub children: Vec<SyntaxNode>,
    pub span: Span,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            id: 0,
            kind,
            value: None,
            children: Vec::new(),
            span,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<SyntaxNode>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first, parent-before-children iteration over the subtree.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Number of nodes in the subtree, `self` included.
    pub fn size(&self) -> usize {
        self.preorder().count()
    }

    /// Compares kind, value and shape; ids and spans are ignored.
    pub fn structurally_eq(&self, other: &SyntaxNode) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structurally_eq(b))
    }

    /// Source text covered by the node.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.span.byte_range()).unwrap_or_default()
    }
}

pub struct Preorder<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Parsed file: the root node plus what is needed to report on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub path: PathBuf,
    pub language: String,
    pub source: String,
    pub root: SyntaxNode,
}

impl SyntaxTree {
    /// Builds a tree and renumbers node ids in preorder.
    pub fn new(
        path: impl AsRef<Path>,
        language: impl Into<String>,
        source: String,
        mut root: SyntaxNode,
    ) -> Self {
        let mut next = 0usize;
        assign_ids(&mut root, &mut next);
        Self {
            path: path.as_ref().to_path_buf(),
            language: language.into(),
            source,
            root,
        }
    }

    pub fn node_count(&self) -> usize {
        self.root.size()
    }

    pub fn text(&self, node: &SyntaxNode) -> &str {
        node.text(&self.source)
    }

    /// Text of the 1-based `line` without its terminator.
    pub fn line_text(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|idx| self.source.lines().nth(idx))
            .unwrap_or_default()
    }
}

fn assign_ids(node: &mut SyntaxNode, next: &mut usize) {
    node.id = *next;
    *next += 1;
    for child in &mut node.children {
        assign_ids(child, next);
    }
}
