//! Import processor (§4.4): per-module `local_name → resolved_qn` mapping,
//! built from each file's raw import statement text.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

/// One module's `local_name → resolved_qn` table, plus wildcard imports
/// recorded under the synthetic key `"*<source>"` per §4.4.
#[derive(Debug, Default, Clone)]
pub struct ModuleImports(pub HashMap<String, String>);

/// Builds and holds the per-module import mapping for a pipeline run.
#[derive(Debug, Default)]
pub struct ImportProcessor {
    mapping: HashMap<String, ModuleImports>,
}

impl ImportProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `local_name` in `module_qn`'s import mapping.
    #[must_use]
    pub fn resolve(&self, module_qn: &str, local_name: &str) -> Option<&str> {
        self.mapping.get(module_qn)?.0.get(local_name).map(String::as_str)
    }

    /// The full mapping for a module, if any imports were processed for it.
    #[must_use]
    pub fn mapping_for(&self, module_qn: &str) -> Option<&ModuleImports> {
        self.mapping.get(module_qn)
    }

    /// Process one raw Python import statement (`import ...` or
    /// `from ... import ...`), recording entries under `module_qn`.
    pub fn process_python(&mut self, module_qn: &str, raw: &str, project_name: &str) {
        let entry = self.mapping.entry(module_qn.to_owned()).or_default();

        if let Some(captures) = python_import_re().captures(raw) {
            for target in captures["targets"].split(',') {
                let target = target.trim();
                if target.is_empty() {
                    continue;
                }
                let (name, alias) = split_as(target);
                // Plain `import a.b` binds the top-level segment `a`, not the
                // full dotted name; an alias binds exactly itself instead.
                let local = alias.unwrap_or_else(|| name.split('.').next().unwrap_or(name));
                entry.0.insert(local.to_owned(), resolve_module(name, project_name));
            }
            return;
        }

        if let Some(captures) = python_from_import_re().captures(raw) {
            let dots = &captures["dots"];
            let source = &captures["source"];
            let targets = &captures["targets"];

            let base_module = if dots.is_empty() {
                resolve_module(source, project_name)
            } else {
                climb_module(module_qn, dots.len(), source)
            };

            for target in targets.split(',') {
                let target = target.trim();
                if target.is_empty() {
                    continue;
                }
                if target == "*" {
                    entry.0.insert(format!("*{base_module}"), base_module.clone());
                    continue;
                }
                let (name, alias) = split_as(target);
                let local = alias.unwrap_or(name);
                entry.0.insert(local.to_owned(), format!("{base_module}.{name}"));
            }
        }
    }

    /// Process one raw JavaScript/TypeScript import statement, resolving
    /// relative module paths against the importing file's path.
    pub fn process_javascript(&mut self, module_qn: &str, raw: &str, project_name: &str, importer_path: &Path) {
        let entry = self.mapping.entry(module_qn.to_owned()).or_default();

        let Some(captures) = js_import_re().captures(raw) else { return };
        let source = captures.name("source").map(|m| m.as_str()).unwrap_or_default();
        let resolved_source = resolve_js_module(source, project_name, importer_path);

        if let Some(default_name) = captures.name("default") {
            entry.0.insert(default_name.as_str().to_owned(), resolved_source.clone());
        }
        if let Some(namespace) = captures.name("namespace") {
            entry.0.insert(namespace.as_str().to_owned(), resolved_source.clone());
        }
        if let Some(named) = captures.name("named") {
            for item in named.as_str().split(',') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                let (name, alias) = split_as_js(item);
                let local = alias.unwrap_or(name);
                entry.0.insert(local.to_owned(), format!("{resolved_source}.{name}"));
            }
        }
    }
}

fn resolve_module(dotted: &str, project_name: &str) -> String {
    format!("{project_name}.{dotted}")
}

fn climb_module(module_qn: &str, dot_count: usize, trailing: &str) -> String {
    let mut segments: Vec<&str> = module_qn.split('.').collect();
    // One leading dot means "this module's package"; each additional dot
    // climbs one more level, per §4.4.
    for _ in 0..dot_count.saturating_sub(1) {
        segments.pop();
    }
    // Drop the module's own leaf segment to land on its containing package.
    segments.pop();

    if trailing.is_empty() {
        segments.join(".")
    } else {
        format!("{}.{trailing}", segments.join("."))
    }
}

fn resolve_js_module(source: &str, project_name: &str, importer_path: &Path) -> String {
    if let Some(relative) = source.strip_prefix("./").or_else(|| source.strip_prefix("../")) {
        let base = importer_path.parent().unwrap_or_else(|| Path::new(""));
        let joined = base.join(relative);
        let dotted = joined.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect::<Vec<_>>().join(".");
        let dotted = dotted.trim_end_matches(".ts").trim_end_matches(".tsx").trim_end_matches(".js").trim_end_matches(".jsx").to_owned();
        format!("{project_name}.{dotted}")
    } else {
        source.to_owned()
    }
}

fn split_as(target: &str) -> (&str, Option<&str>) {
    match target.split_once(" as ") {
        Some((name, alias)) => (name.trim(), Some(alias.trim())),
        None => (target.trim(), None),
    }
}

fn split_as_js(target: &str) -> (&str, Option<&str>) {
    match target.split_once(" as ") {
        Some((name, alias)) => (name.trim(), Some(alias.trim())),
        None => (target.trim(), None),
    }
}

fn python_import_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*import\s+(?P<targets>[\w.,\s]+?)\s*$").expect("valid regex"))
}

fn python_from_import_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*from\s+(?P<dots>\.*)(?P<source>[\w.]*)\s+import\s+(?P<targets>.+?)\s*$").expect("valid regex")
    })
}

fn js_import_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            ^\s*import\s+
            (?:
                (?:(?P<default>\w+)\s*,?\s*)?
                (?:\*\s+as\s+(?P<namespace>\w+)\s*,?\s*)?
                (?:\{\s*(?P<named>[^}]*)\s*\}\s*,?\s*)?
            )
            from\s+["'](?P<source>[^"']+)["']
            "#,
        )
        .expect("valid regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_plain_import_maps_top_level_segment() {
        let mut proc = ImportProcessor::new();
        proc.process_python("proj.m", "import a.b", "proj");
        assert_eq!(proc.resolve("proj.m", "a"), Some("proj.a.b"));
    }

    #[test]
    fn python_from_import_with_alias() {
        let mut proc = ImportProcessor::new();
        proc.process_python("proj.m", "from a.b import c as d", "proj");
        assert_eq!(proc.resolve("proj.m", "d"), Some("proj.a.b.c"));
    }

    #[test]
    fn python_relative_import_climbs_by_dot_count() {
        let mut proc = ImportProcessor::new();
        proc.process_python("proj.pkg.sub.m", "from . import x", "proj");
        assert_eq!(proc.resolve("proj.pkg.sub.m", "x"), Some("proj.pkg.sub.x"));
    }

    #[test]
    fn python_wildcard_import_recorded_under_star_key() {
        let mut proc = ImportProcessor::new();
        proc.process_python("proj.m", "from a.b import *", "proj");
        assert_eq!(proc.resolve("proj.m", "*proj.a.b"), Some("proj.a.b"));
    }

    #[test]
    fn js_named_import_resolves_relative_path() {
        let mut proc = ImportProcessor::new();
        proc.process_javascript("proj.src.app", r#"import { Foo } from "./models";"#, "proj", Path::new("src/app.js"));
        assert_eq!(proc.resolve("proj.src.app", "Foo"), Some("proj.src.models.Foo"));
    }

    #[test]
    fn js_default_import_maps_local_name() {
        let mut proc = ImportProcessor::new();
        proc.process_javascript("proj.src.app", r#"import Foo from "./foo";"#, "proj", Path::new("src/app.js"));
        assert_eq!(proc.resolve("proj.src.app", "Foo"), Some("proj.src.foo"));
    }
}
