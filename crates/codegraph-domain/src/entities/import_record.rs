//! `ImportRecord`: one parsed import statement.

use serde::{Deserialize, Serialize};

/// One import statement extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// The local name bound by the import (e.g. `d` in `import x as d`, or
    /// `*source` for a wildcard import).
    pub name: String,
    /// Alias, if the import renamed the binding (`import a as b`).
    pub alias: Option<String>,
    /// The module string as written in source (e.g. `a.b`, `./utils`).
    pub source_module: String,
    /// Whether `source_module` resolves outside the project tree.
    pub is_external: bool,
    /// 1-based source line of the import statement.
    pub line_number: usize,
}
