//! Syntax model for **sastgate**.
//!
//! Parsers lower every supported language into a [`SyntaxTree`] made of
//! [`SyntaxNode`]s. Patterns are compiled into the same shape, which is what
//! lets the engine match them structurally without knowing the grammar.
//!
//! # Example
//! ```
//! use ir::{NodeKind, Span, SyntaxNode, SyntaxTree};
//! let call = SyntaxNode::new(NodeKind::Call, Span::default()).with_children(vec![
//!     SyntaxNode::new(NodeKind::Identifier, Span::default()).with_value("eval"),
//!     SyntaxNode::new(NodeKind::Arguments, Span::default()),
//! ]);
//! let root = SyntaxNode::new(NodeKind::Module, Span::default()).with_children(vec![call]);
//! let tree = SyntaxTree::new("a.py", "python", "eval()".into(), root);
//! assert_eq!(tree.node_count(), 4);
//! assert_eq!(tree.root.children[0].children[1].id, 3);
//! ```

pub mod ast;

pub use ast::{NodeKind, Position, Preorder, Span, SyntaxNode, SyntaxTree};

#[cfg(test)]
mod tests;
