//! Inheritance tracker (§4.5): `class_qn -> [parent_qn_or_raw]` plus MRO
//! computation by breadth-first traversal with cycle protection.

use std::collections::{HashMap, HashSet, VecDeque};

use codegraph_domain::entities::{CodeEntity, EntityKind};
use codegraph_domain::value_objects::QualifiedName;

use crate::registry::SymbolRegistry;

/// Tracks each class's raw and resolved base classes, and answers MRO
/// queries over the resulting graph.
#[derive(Debug, Default)]
pub struct InheritanceTracker {
    /// `class_qn -> parent qn-or-raw-name`, in declaration order. A parent
    /// stays a raw name (e.g. `"Exception"`) when it can't be resolved
    /// against the registry or import mapping.
    parents: HashMap<String, Vec<String>>,
}

impl InheritanceTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one class's base classes. Each raw base name is resolved, in
    /// order: an explicit import mapping (`resolve_import`), then the
    /// symbol registry by simple name (preferring a candidate in the same
    /// module), falling back to the raw name when nothing matches.
    pub fn record_class(
        &mut self,
        class_qn: &QualifiedName,
        base_classes: &[String],
        module_qn: &str,
        registry: &SymbolRegistry,
        resolve_import: impl Fn(&str, &str) -> Option<String>,
    ) {
        let resolved = base_classes
            .iter()
            .map(|raw| {
                let simple = raw.split(['<', '(']).next().unwrap_or(raw).trim();
                resolve_import(module_qn, simple)
                    .or_else(|| resolve_via_registry(registry, module_qn, simple))
                    .unwrap_or_else(|| simple.to_owned())
            })
            .collect();
        self.parents.insert(class_qn.as_str().to_owned(), resolved);
    }

    /// Walk every class entity in `entities` (recursing into nested
    /// classes, if any) and record it via [`Self::record_class`].
    pub fn record_all(&mut self, entities: &[CodeEntity], module_qn: &str, registry: &SymbolRegistry, resolve_import: impl Fn(&str, &str) -> Option<String> + Copy) {
        for entity in entities {
            if let EntityKind::Class { base_classes, children } = &entity.kind {
                self.record_class(&entity.qualified_name, base_classes, module_qn, registry, resolve_import);
                self.record_all(children, module_qn, registry, resolve_import);
            }
        }
    }

    /// Direct parents of `class_qn`, as recorded (resolved QN or raw name).
    #[must_use]
    pub fn parents_of(&self, class_qn: &str) -> &[String] {
        self.parents.get(class_qn).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Method resolution order for `class_qn`: itself first, then its
    /// ancestors in breadth-first order, each appearing once. A base class
    /// that isn't itself tracked (no further ancestors known, or an
    /// external/raw name) terminates that branch.
    #[must_use]
    pub fn mro(&self, class_qn: &str) -> Vec<String> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back(class_qn.to_owned());
        visited.insert(class_qn.to_owned());

        while let Some(current) = queue.pop_front() {
            order.push(current.clone());
            for parent in self.parents_of(&current) {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }

        order
    }
}

fn resolve_via_registry(registry: &SymbolRegistry, module_qn: &str, simple: &str) -> Option<String> {
    let candidates = registry.find_by_simple_name(simple);
    candidates
        .iter()
        .find(|qn| qn.starts_with(module_qn) && qn.as_str() != simple)
        .or_else(|| candidates.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mro_lists_self_then_ancestors_breadth_first() {
        let mut tracker = InheritanceTracker::new();
        tracker.parents.insert("proj.a.C".to_owned(), vec!["proj.a.B".to_owned()]);
        tracker.parents.insert("proj.a.B".to_owned(), vec!["proj.a.A".to_owned()]);
        tracker.parents.insert("proj.a.A".to_owned(), vec![]);

        assert_eq!(tracker.mro("proj.a.C"), vec!["proj.a.C".to_owned(), "proj.a.B".to_owned(), "proj.a.A".to_owned()]);
    }

    #[test]
    fn mro_handles_diamond_without_duplicating_ancestor() {
        let mut tracker = InheritanceTracker::new();
        tracker.parents.insert("proj.a.D".to_owned(), vec!["proj.a.B".to_owned(), "proj.a.C".to_owned()]);
        tracker.parents.insert("proj.a.B".to_owned(), vec!["proj.a.A".to_owned()]);
        tracker.parents.insert("proj.a.C".to_owned(), vec!["proj.a.A".to_owned()]);
        tracker.parents.insert("proj.a.A".to_owned(), vec![]);

        let order = tracker.mro("proj.a.D");
        assert_eq!(order.iter().filter(|qn| qn.as_str() == "proj.a.A").count(), 1);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn mro_protects_against_cycles() {
        let mut tracker = InheritanceTracker::new();
        tracker.parents.insert("proj.a.X".to_owned(), vec!["proj.a.Y".to_owned()]);
        tracker.parents.insert("proj.a.Y".to_owned(), vec!["proj.a.X".to_owned()]);

        let order = tracker.mro("proj.a.X");
        assert_eq!(order, vec!["proj.a.X".to_owned(), "proj.a.Y".to_owned()]);
    }

    #[test]
    fn unresolved_base_name_kept_raw() {
        let mut tracker = InheritanceTracker::new();
        let registry = SymbolRegistry::new();
        let qn = QualifiedName::new("proj.a.MyError");
        tracker.record_class(&qn, &["Exception".to_owned()], "proj.a", &registry, |_, _| None);
        assert_eq!(tracker.parents_of("proj.a.MyError"), &["Exception".to_owned()]);
    }

    #[test]
    fn base_name_resolved_via_registry_same_module_preferred() {
        let mut tracker = InheritanceTracker::new();
        let mut registry = SymbolRegistry::new();
        registry.register("proj.other.Base", "class");
        registry.register("proj.a.Base", "class");

        let qn = QualifiedName::new("proj.a.Child");
        tracker.record_class(&qn, &["Base".to_owned()], "proj.a", &registry, |_, _| None);
        assert_eq!(tracker.parents_of("proj.a.Child"), &["proj.a.Base".to_owned()]);
    }
}
