//! Supported source languages.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A source language recognized by the scanner and parser.
///
/// `Jsx`/`Tsx` are tracked as distinct from `JavaScript`/`TypeScript` because
/// the per-language tree-sitter grammar and node-type configuration differ
/// (JSX elements are additional node kinds layered on top of the base
/// grammar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python
    #[display("python")]
    Python,
    /// JavaScript
    #[display("javascript")]
    JavaScript,
    /// TypeScript
    #[display("typescript")]
    TypeScript,
    /// JavaScript with JSX
    #[display("jsx")]
    Jsx,
    /// TypeScript with TSX
    #[display("tsx")]
    Tsx,
    /// Rust
    #[display("rust")]
    Rust,
    /// Java
    #[display("java")]
    Java,
    /// Go
    #[display("go")]
    Go,
    /// C++
    #[display("cpp")]
    Cpp,
}

impl Language {
    /// Resolve a language from a lowercase file extension (without the
    /// leading dot). Returns `None` for unsupported extensions.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext {
            "py" => Self::Python,
            "js" | "mjs" | "cjs" => Self::JavaScript,
            "jsx" => Self::Jsx,
            "ts" | "mts" | "cts" => Self::TypeScript,
            "tsx" => Self::Tsx,
            "rs" => Self::Rust,
            "java" => Self::Java,
            "go" => Self::Go,
            "cpp" | "cc" | "cxx" | "hpp" | "h" | "hxx" => Self::Cpp,
            _ => return None,
        })
    }

    /// All file extensions (without the leading dot) recognized for this
    /// language.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["py"],
            Self::JavaScript => &["js", "mjs", "cjs"],
            Self::Jsx => &["jsx"],
            Self::TypeScript => &["ts", "mts", "cts"],
            Self::Tsx => &["tsx"],
            Self::Rust => &["rs"],
            Self::Java => &["java"],
            Self::Go => &["go"],
            Self::Cpp => &["cpp", "cc", "cxx", "hpp", "h", "hxx"],
        }
    }
}
