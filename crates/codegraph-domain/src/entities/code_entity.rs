//! `CodeEntity`: the parsed representation of a class, function, or method.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::value_objects::QualifiedName;

/// Kind-specific data for a [`CodeEntity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// A class (or struct/interface-like construct, language-dependent).
    Class {
        /// Raw (unresolved) parent-class names, in declaration order.
        base_classes: Vec<String>,
        /// Nested entities — methods, and for some languages nested
        /// classes.
        children: Vec<CodeEntity>,
    },
    /// A free function.
    Function {
        /// Whether the function is declared `async`.
        is_async: bool,
        /// Raw call-site strings as they appear in source, deduplicated
        /// within this function, in first-occurrence order.
        calls: Vec<String>,
    },
    /// A method defined on a class.
    Method {
        /// Whether the method is declared `async`.
        is_async: bool,
        /// Raw call-site strings, deduplicated within this method.
        calls: Vec<String>,
        /// Qualified name of the enclosing class.
        parent_class: QualifiedName,
        /// Whether the method is static.
        is_static: bool,
        /// Whether the method is a classmethod (Python-style).
        is_classmethod: bool,
    },
}

impl EntityKind {
    /// Short tag used for graph labels and chunk metadata: `"class"`,
    /// `"function"`, or `"method"`.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Class { .. } => "class",
            Self::Function { .. } => "function",
            Self::Method { .. } => "method",
        }
    }

    /// The raw call-site strings, for `Function`/`Method`; empty for
    /// `Class`.
    #[must_use]
    pub fn calls(&self) -> &[String] {
        match self {
            Self::Class { .. } => &[],
            Self::Function { calls, .. } | Self::Method { calls, .. } => calls,
        }
    }
}

/// A parsed class, function, or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntity {
    /// Local (unqualified) name.
    pub name: String,
    /// Fully qualified name, unique within its project.
    pub qualified_name: QualifiedName,
    /// Source-level signature text (parameter list, return type if
    /// annotated).
    pub signature: String,
    /// Docstring or leading doc comment, if present.
    pub docstring: Option<String>,
    /// Full source text of the entity.
    pub code: String,
    /// 1-based, inclusive start line.
    pub start_line: usize,
    /// 1-based, inclusive end line.
    pub end_line: usize,
    /// Path of the file this entity was declared in (relative to the
    /// project root).
    pub file_path: PathBuf,
    /// Kind-specific data.
    pub kind: EntityKind,
}

impl CodeEntity {
    /// Deduplicate call-site strings in place, keeping first-occurrence
    /// order, for `Function`/`Method` entities (and all of a class's
    /// method children).
    pub fn dedupe_calls(&mut self) {
        match &mut self.kind {
            EntityKind::Function { calls, .. } | EntityKind::Method { calls, .. } => {
                dedupe_preserving_order(calls);
            }
            EntityKind::Class { children, .. } => {
                for child in children {
                    child.dedupe_calls();
                }
            }
        }
    }

    /// Methods nested in a class entity, flattened; empty for
    /// function/method entities.
    #[must_use]
    pub fn methods(&self) -> Vec<&CodeEntity> {
        match &self.kind {
            EntityKind::Class { children, .. } => children
                .iter()
                .filter(|c| matches!(c.kind, EntityKind::Method { .. }))
                .collect(),
            EntityKind::Function { .. } | EntityKind::Method { .. } => Vec::new(),
        }
    }
}

fn dedupe_preserving_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::with_capacity(items.len());
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, calls: Vec<&str>) -> CodeEntity {
        CodeEntity {
            name: name.to_owned(),
            qualified_name: QualifiedName::new(format!("proj.a.Foo.{name}")),
            signature: "()".to_owned(),
            docstring: None,
            code: String::new(),
            start_line: 1,
            end_line: 1,
            file_path: "a.py".into(),
            kind: EntityKind::Method {
                is_async: false,
                calls: calls.into_iter().map(str::to_owned).collect(),
                parent_class: QualifiedName::new("proj.a.Foo"),
                is_static: false,
                is_classmethod: false,
            },
        }
    }

    #[test]
    fn dedupe_calls_keeps_first_occurrence_order() {
        let mut m = method("bar", vec!["self.x()", "self.y()", "self.x()"]);
        m.dedupe_calls();
        assert_eq!(m.kind.calls(), &["self.x()".to_owned(), "self.y()".to_owned()]);
    }

    #[test]
    fn class_methods_count_matches_children() {
        let class = CodeEntity {
            name: "Foo".to_owned(),
            qualified_name: QualifiedName::new("proj.a.Foo"),
            signature: String::new(),
            docstring: None,
            code: String::new(),
            start_line: 1,
            end_line: 10,
            file_path: "a.py".into(),
            kind: EntityKind::Class {
                base_classes: vec![],
                children: vec![method("bar", vec![]), method("baz", vec![])],
            },
        };
        assert_eq!(class.methods().len(), 2);
    }
}
