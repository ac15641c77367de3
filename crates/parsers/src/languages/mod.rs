//! Supported languages and their grammar tables.
//!
//! Each language module maps its tree-sitter node kinds onto the generic
//! [`ir::NodeKind`] categories. Kinds a table does not mention are kept as
//! [`ir::NodeKind::Other`] with their grammar name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::lower::Grammar;

pub mod javascript;
pub mod python;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::TypeScript];

    pub fn name(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
        }
    }

    /// Accepts the canonical name and the usual short aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Some(Language::Python),
            "javascript" | "js" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Detects the language from the file extension.
    ///
    /// # Example
    /// ```
    /// use parsers::Language;
    /// use std::path::Path;
    /// assert_eq!(Language::from_path(Path::new("app.py")), Some(Language::Python));
    /// assert_eq!(Language::from_path(Path::new("README.md")), None);
    /// ```
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "py" | "pyw" => Some(Language::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "mts" | "cts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    pub(crate) fn grammar(self) -> Grammar {
        match self {
            Language::Python => python::grammar(),
            Language::JavaScript => javascript::grammar(),
            Language::TypeScript => javascript::typescript_grammar(),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_name(s).ok_or_else(|| format!("unsupported language '{s}'"))
    }
}
