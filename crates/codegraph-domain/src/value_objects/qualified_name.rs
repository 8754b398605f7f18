//! Qualified names (`QN`): dotted, project-unique identifiers for code
//! entities.

use std::path::Path;

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A dotted, project-unique identifier for a module, class, function, or
/// method.
///
/// Construction always goes through [`QualifiedName::for_module`] or
/// [`QualifiedName::child`] so the dotted-segment invariant holds: every
/// `QualifiedName` is a non-empty sequence of `.`-joined segments with no
/// empty segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[display("{_0}")]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Wrap an already-dotted string verbatim. Used when reading qualified
    /// names back out of a store where the invariant was established at
    /// write time.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derive the module QN for a file at `relative_path` within project
    /// `project_name`.
    ///
    /// `project_name.foo.bar` for a file at `rel/foo/bar.py`; an
    /// `__init__` stem is stripped so the package directory itself becomes
    /// the module (`rel/foo/__init__.py` -> `project_name.foo`, not
    /// `project_name.foo.__init__`).
    #[must_use]
    pub fn for_module(project_name: &str, relative_path: &Path) -> Self {
        let mut segments = vec![project_name.to_owned()];
        let mut components: Vec<String> = relative_path
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        if components.last().map(String::as_str) == Some("__init__") {
            components.pop();
        }
        segments.extend(components);
        Self(segments.join("."))
    }

    /// Build `self.local_name`, the qualified name of a child entity
    /// (function, class, or member) declared directly under `self`.
    #[must_use]
    pub fn child(&self, local_name: &str) -> Self {
        Self(format!("{}.{local_name}", self.0))
    }

    /// The raw dotted string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The dot-separated segments.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }

    /// The last segment — the entity's local name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    /// The QN with its last segment removed, or `None` if this is a single
    /// segment (a top-level module with no package prefix).
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(head, _)| Self(head.to_owned()))
    }

    /// Whether `self` lives under the dotted prefix `other` (either equal
    /// or `other` followed by `.`).
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.0 == prefix || self.0.starts_with(&format!("{prefix}."))
    }

    /// Number of dotted segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches('.').count() + 1
    }
}

impl From<QualifiedName> for String {
    fn from(qn: QualifiedName) -> Self {
        qn.0
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_qn_strips_init_tail() {
        let qn = QualifiedName::for_module("proj", Path::new("foo/__init__.py"));
        assert_eq!(qn.as_str(), "proj.foo");
    }

    #[test]
    fn module_qn_joins_components() {
        let qn = QualifiedName::for_module("proj", Path::new("foo/bar.py"));
        assert_eq!(qn.as_str(), "proj.foo.bar");
    }

    #[test]
    fn child_and_simple_name_round_trip() {
        let module = QualifiedName::for_module("proj", Path::new("a.py"));
        let method = module.child("Foo").child("bar");
        assert_eq!(method.as_str(), "proj.a.Foo.bar");
        assert_eq!(method.simple_name(), "bar");
        assert_eq!(method.parent().unwrap().as_str(), "proj.a.Foo");
    }

    #[test]
    fn starts_with_matches_prefix_boundary() {
        let qn = QualifiedName::new("proj.a.Foo");
        assert!(qn.starts_with("proj.a"));
        assert!(qn.starts_with("proj.a.Foo"));
        assert!(!qn.starts_with("proj.a.Fo"));
    }
}
