//! Symbol registry (§4.3): a process-scoped map of qualified names to
//! entity kind, with O(1) exact/simple-name lookup and O(k) prefix lookup.

use std::collections::{HashMap, HashSet};

/// An entity kind tag, as returned by `EntityKind::tag()`: `"class"`,
/// `"function"`, or `"method"`.
pub type Kind = &'static str;

/// Registry of every entity qualified name known for the current pipeline
/// run, with the auxiliary indexes §4.3 requires.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    by_qn: HashMap<String, Kind>,
    by_simple_name: HashMap<String, HashSet<String>>,
    /// Prefix trie keyed by dotted segment; each node tracks the QNs whose
    /// dotted-segment path passes through it, matching §4.3's
    /// `find_with_prefix`.
    trie_root: TrieNode,
    /// `qn -> declared return type` for functions/methods, parsed from each
    /// entity's signature. Consumed by the call resolver's method-chain
    /// strategy to resolve `a.b().c()`.
    return_types: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<String, TrieNode>,
    /// `(qn, kind)` pairs that terminate exactly at this node.
    leaves: Vec<(String, Kind)>,
}

impl SymbolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `qn` with `kind`. Re-registering an existing `qn` updates
    /// its kind in place.
    pub fn register(&mut self, qn: &str, kind: Kind) {
        self.unregister(qn);

        self.by_qn.insert(qn.to_owned(), kind);
        let simple = simple_name(qn);
        self.by_simple_name.entry(simple.to_owned()).or_default().insert(qn.to_owned());

        let mut node = &mut self.trie_root;
        for segment in qn.split('.') {
            node = node.children.entry(segment.to_owned()).or_default();
        }
        node.leaves.push((qn.to_owned(), kind));
    }

    /// Remove `qn`. Returns `true` if it was present.
    pub fn unregister(&mut self, qn: &str) -> bool {
        let Some(_) = self.by_qn.remove(qn) else { return false };
        self.return_types.remove(qn);

        let simple = simple_name(qn);
        if let Some(set) = self.by_simple_name.get_mut(simple) {
            set.remove(qn);
            if set.is_empty() {
                self.by_simple_name.remove(simple);
            }
        }

        let mut node = &mut self.trie_root;
        for segment in qn.split('.') {
            let Some(next) = node.children.get_mut(segment) else { return true };
            node = next;
        }
        node.leaves.retain(|(leaf_qn, _)| leaf_qn != qn);

        true
    }

    /// Exact lookup.
    #[must_use]
    pub fn get(&self, qn: &str) -> Option<Kind> {
        self.by_qn.get(qn).copied()
    }

    /// Record `qn`'s declared return type (already normalized, e.g. with
    /// generics stripped).
    pub fn register_return_type(&mut self, qn: &str, return_type: &str) {
        self.return_types.insert(qn.to_owned(), return_type.to_owned());
    }

    /// `qn`'s declared return type, if one was recorded.
    #[must_use]
    pub fn return_type(&self, qn: &str) -> Option<&str> {
        self.return_types.get(qn).map(String::as_str)
    }

    /// All QNs whose last dotted segment equals `name`.
    #[must_use]
    pub fn find_by_simple_name(&self, name: &str) -> Vec<String> {
        self.by_simple_name.get(name).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    /// All `(qn, kind)` pairs whose dotted path starts with `prefix`.
    #[must_use]
    pub fn find_with_prefix(&self, prefix: &str) -> Vec<(String, Kind)> {
        let mut node = &self.trie_root;
        for segment in prefix.split('.') {
            let Some(next) = node.children.get(segment) else { return Vec::new() };
            node = next;
        }

        let mut out = Vec::new();
        collect_subtree(node, &mut out);
        out
    }

    /// All QNs ending with `suffix` — a dotted tail match. When `suffix`
    /// contains no `.`, this is O(1) via the simple-name index.
    #[must_use]
    pub fn find_ending_with(&self, suffix: &str) -> Vec<String> {
        if !suffix.contains('.') {
            return self.find_by_simple_name(suffix);
        }
        self.by_qn.keys().filter(|qn| ends_with_boundary(qn, suffix)).cloned().collect()
    }

    /// Remove every QN under `prefix` (inclusive), returning the count
    /// removed.
    pub fn remove_by_prefix(&mut self, prefix: &str) -> usize {
        let matches: Vec<String> = self.find_with_prefix(prefix).into_iter().map(|(qn, _)| qn).collect();
        let count = matches.len();
        for qn in matches {
            self.unregister(&qn);
        }
        count
    }
}

fn collect_subtree(node: &TrieNode, out: &mut Vec<(String, Kind)>) {
    out.extend(node.leaves.iter().cloned());
    for child in node.children.values() {
        collect_subtree(child, out);
    }
}

fn simple_name(qn: &str) -> &str {
    qn.rsplit('.').next().unwrap_or(qn)
}

fn ends_with_boundary(qn: &str, suffix: &str) -> bool {
    qn == suffix || qn.ends_with(&format!(".{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_lookup_finds_registered_qn() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo.bar", "method");
        assert_eq!(reg.find_by_simple_name("bar"), vec!["proj.a.Foo.bar".to_owned()]);
    }

    #[test]
    fn prefix_lookup_returns_descendants() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo", "class");
        reg.register("proj.a.Foo.bar", "method");
        reg.register("proj.b.Baz", "class");

        let mut found: Vec<_> = reg.find_with_prefix("proj.a").into_iter().map(|(qn, _)| qn).collect();
        found.sort();
        assert_eq!(found, vec!["proj.a.Foo".to_owned(), "proj.a.Foo.bar".to_owned()]);
    }

    #[test]
    fn unregister_keeps_indexes_consistent() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo.bar", "method");
        assert!(reg.unregister("proj.a.Foo.bar"));
        assert!(reg.find_by_simple_name("bar").is_empty());
        assert!(reg.find_with_prefix("proj.a").is_empty());
        assert_eq!(reg.get("proj.a.Foo.bar"), None);
    }

    #[test]
    fn find_ending_with_dotted_suffix_respects_segment_boundary() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo.bar", "method");
        reg.register("proj.a.NotFoo.bar", "method");

        let found = reg.find_ending_with("Foo.bar");
        assert!(found.contains(&"proj.a.Foo.bar".to_owned()));
        assert!(!found.contains(&"proj.a.NotFoo.bar".to_owned()));
    }

    #[test]
    fn remove_by_prefix_removes_every_descendant() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo", "class");
        reg.register("proj.a.Foo.bar", "method");
        assert_eq!(reg.remove_by_prefix("proj.a.Foo"), 2);
        assert_eq!(reg.get("proj.a.Foo"), None);
    }

    #[test]
    fn return_type_is_cleared_on_unregister() {
        let mut reg = SymbolRegistry::new();
        reg.register("proj.a.Foo.bar", "method");
        reg.register_return_type("proj.a.Foo.bar", "Baz");
        assert_eq!(reg.return_type("proj.a.Foo.bar"), Some("Baz"));
        reg.unregister("proj.a.Foo.bar");
        assert_eq!(reg.return_type("proj.a.Foo.bar"), None);
    }

    #[test]
    fn invariant_every_registered_qn_is_findable_by_simple_name() {
        let mut reg = SymbolRegistry::new();
        for qn in ["proj.a.f", "proj.b.Foo.bar", "proj.c.Baz"] {
            reg.register(qn, "function");
        }
        for qn in ["proj.a.f", "proj.b.Foo.bar", "proj.c.Baz"] {
            let last = qn.rsplit('.').next().unwrap();
            assert!(reg.find_by_simple_name(last).contains(&qn.to_owned()));
        }
    }
}
