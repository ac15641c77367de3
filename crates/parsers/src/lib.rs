//! Converters of source files into the [`ir`] syntax model.
//!
//! tree-sitter does the parsing; [`lower`] turns its concrete tree into
//! generic [`SyntaxNode`]s. Pattern snippets from rules are parsed through
//! [`parse_snippet`] so that rules and sources share one representation.

use ir::{NodeKind, SyntaxNode, SyntaxTree};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub mod languages;
mod lower;

pub use languages::Language;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file type: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("{}:{line}:{column}: syntax error", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },
    #[error("{language} grammar unavailable: {reason}")]
    Grammar { language: Language, reason: String },
}

/// Determines the language of `path` from its extension.
///
/// # Example
/// ```
/// use parsers::{detect_language, Language};
/// assert_eq!(detect_language(std::path::Path::new("src/app.ts")), Some(Language::TypeScript));
/// ```
pub fn detect_language(path: &Path) -> Option<Language> {
    let detected = Language::from_path(path);
    match detected {
        Some(lang) => debug!(file = %path.display(), language = %lang, "Language detected"),
        None => debug!(file = %path.display(), "Unsupported file type"),
    }
    detected
}

/// Reads a file and produces its [`SyntaxTree`].
///
/// # Example
/// ```
/// use parsers::parse_file;
/// use std::fs;
/// let path = std::env::temp_dir().join("sastgate_doc_example.py");
/// fs::write(&path, "import os\nos.system(cmd)\n").unwrap();
/// let tree = parse_file(&path).unwrap();
/// assert_eq!(tree.language, "python");
/// assert_eq!(tree.root.children.len(), 2);
/// ```
pub fn parse_file(path: &Path) -> Result<SyntaxTree, ParseError> {
    let language =
        detect_language(path).ok_or_else(|| ParseError::Unsupported(path.to_path_buf()))?;
    let source = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, language, source)
}

/// Parses in-memory source attributed to `path`.
pub fn parse_source(
    path: &Path,
    language: Language,
    source: String,
) -> Result<SyntaxTree, ParseError> {
    let root = parse_to_node(path, language, &source)?;
    Ok(SyntaxTree::new(path, language.name(), source, root))
}

/// Parses a rule snippet. The returned root is always a `Module`.
pub fn parse_snippet(language: Language, text: &str) -> Result<SyntaxNode, ParseError> {
    parse_to_node(Path::new("<pattern>"), language, text)
}

fn parse_to_node(path: &Path, language: Language, source: &str) -> Result<SyntaxNode, ParseError> {
    let grammar = language.grammar();
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language((grammar.language)())
        .map_err(|e| ParseError::Grammar {
            language,
            reason: format!("{e:?}"),
        })?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Grammar {
            language,
            reason: "parser produced no tree".into(),
        })?;
    let root = tree.root_node();
    if let Some(err) = lower::first_error(root) {
        let pos = err.start_position();
        debug!(file = %path.display(), line = pos.row + 1, "Syntax error");
        return Err(ParseError::Syntax {
            path: path.to_path_buf(),
            line: pos.row + 1,
            column: pos.column + 1,
        });
    }
    let node = lower::lower(root, source, &grammar)
        .unwrap_or_else(|| SyntaxNode::new(NodeKind::Module, lower::span_of(root)));
    debug!(file = %path.display(), language = %language, "Parsed");
    Ok(node)
}
