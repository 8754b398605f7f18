//! Intra-procedural, flow-insensitive type inference (§4.6).
//!
//! Builds a `local_var_types: name → type_qn` map for one function body,
//! best-effort and with no confidence tracking. Consumed only by the call
//! resolver's method-chain strategy.

use std::collections::HashMap;

use regex::Regex;

use crate::registry::SymbolRegistry;

/// `local_var_types` for a single function/method body, plus any `self.attr`
/// types recorded while walking it (scoped to the enclosing class).
#[derive(Debug, Default, Clone)]
pub struct LocalTypes {
    pub locals: HashMap<String, String>,
    pub self_attrs: HashMap<String, String>,
}

impl LocalTypes {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.locals.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn get_self_attr(&self, attr: &str) -> Option<&str> {
        self.self_attrs.get(attr).map(String::as_str)
    }
}

/// Parameter list text (e.g. `"(self, name: str, items: List[int] = None)"`)
/// plus the function body text, and a registry for the heuristic
/// param-name/class-name match.
pub fn infer_locals(signature: &str, body: &str, module_qn: &str, registry: &SymbolRegistry) -> LocalTypes {
    let mut types = LocalTypes::default();

    for (name, annotation) in parse_params(signature) {
        if let Some(annotation) = annotation {
            types.locals.insert(name, normalize_annotation(&annotation));
            continue;
        }
        if let Some(candidate) = heuristic_param_type(&name, module_qn, registry) {
            types.locals.insert(name, candidate);
        }
    }

    for line in body.lines() {
        let line = line.trim();

        if let Some(captures) = constructor_assignment_re().captures(line) {
            types.locals.insert(captures["var"].to_owned(), captures["ctor"].to_owned());
            continue;
        }
        if let Some(captures) = literal_assignment_re().captures(line) {
            let inferred = match &captures["literal"] {
                l if l.starts_with('[') => "list",
                l if l.starts_with('{') => "dict",
                l if l.starts_with('"') || l.starts_with('\'') => "str",
                l if l.parse::<i64>().is_ok() => "int",
                l if l.parse::<f64>().is_ok() => "float",
                _ => continue,
            };
            types.locals.insert(captures["var"].to_owned(), inferred.to_owned());
            continue;
        }
        if let Some(captures) = for_loop_re().captures(line) {
            if let Some(element) = first_constructor_in_list(&captures["iterable"]) {
                types.locals.insert(captures["var"].to_owned(), element);
            }
            continue;
        }
        if let Some(captures) = self_attr_re().captures(line) {
            let value_type = types
                .locals
                .get(&captures["value"])
                .cloned()
                .or_else(|| constructor_assignment_re().captures(line).map(|c| c["ctor"].to_owned()));
            if let Some(value_type) = value_type {
                types.self_attrs.insert(captures["attr"].to_owned(), value_type);
            }
        }
    }

    types
}

/// Extract a function/method signature's declared return type, if any:
/// Python's `-> T:` convention, or TypeScript's `(): T {` convention.
#[must_use]
pub fn extract_return_type(signature: &str) -> Option<String> {
    if let Some(captures) = python_return_re().captures(signature) {
        return Some(normalize_annotation(&captures["type"]));
    }
    if let Some(captures) = ts_return_re().captures(signature) {
        return Some(normalize_annotation(&captures["type"]));
    }
    None
}

fn parse_params(signature: &str) -> Vec<(String, Option<String>)> {
    let Some(open) = signature.find('(') else { return Vec::new() };
    let Some(close) = signature.rfind(')') else { return Vec::new() };
    if close <= open {
        return Vec::new();
    }

    signature[open + 1..close]
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() || raw == "self" || raw == "cls" {
                return None;
            }
            let raw = raw.split('=').next().unwrap_or(raw).trim();
            match raw.split_once(':') {
                Some((name, annotation)) => Some((name.trim().to_owned(), Some(annotation.trim().to_owned()))),
                None => Some((raw.trim_start_matches('&').trim().to_owned(), None)),
            }
        })
        .collect()
}

fn normalize_annotation(annotation: &str) -> String {
    let first_alternative = annotation.split('|').next().unwrap_or(annotation).trim();
    let base = first_alternative.split(['[', '<']).next().unwrap_or(first_alternative).trim();
    base.trim_end_matches("[]").to_owned()
}

fn heuristic_param_type(param: &str, module_qn: &str, registry: &SymbolRegistry) -> Option<String> {
    let candidates = registry.find_with_prefix(module_qn);
    let param_lower = param.to_lowercase();

    let mut best: Option<(String, u32)> = None;
    for (qn, kind) in candidates {
        if kind != "class" {
            continue;
        }
        let simple = qn.rsplit('.').next().unwrap_or(&qn).to_lowercase();
        let score = if simple == param_lower {
            100
        } else if simple.ends_with(&param_lower) || param_lower.ends_with(&simple) {
            75
        } else if simple.contains(&param_lower) || param_lower.contains(&simple) {
            51
        } else {
            0
        };
        let improves = match &best {
            Some((_, best_score)) => score > *best_score,
            None => true,
        };
        if score >= 51 && improves {
            best = Some((qn, score));
        }
    }
    best.map(|(qn, _)| qn)
}

fn first_constructor_in_list(iterable: &str) -> Option<String> {
    let items_re = Regex::new(r"\[([^\]]*)\]").ok()?;
    let inner = items_re.captures(iterable)?.get(1)?.as_str();
    let first = inner.split(',').next()?.trim();
    constructor_call_name(first)
}

fn constructor_call_name(expr: &str) -> Option<String> {
    let name = expr.split('(').next()?.trim();
    name.chars().next().filter(|c| c.is_uppercase()).map(|_| name.to_owned())
}

fn constructor_assignment_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<var>\w+)\s*=\s*(?P<ctor>[A-Z]\w*)\(").expect("valid regex"))
}

fn literal_assignment_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(?P<var>\w+)\s*=\s*(?P<literal>\[.*\]|\{.*\}|"[^"]*"|'[^']*'|-?\d+\.?\d*)\s*$"#).expect("valid regex"))
}

fn for_loop_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^for\s+(?P<var>\w+)\s+in\s+(?P<iterable>.+):\s*$").expect("valid regex"))
}

fn self_attr_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^self\.(?P<attr>\w+)\s*=\s*(?P<value>\w+)").expect("valid regex"))
}

fn python_return_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"->\s*(?P<type>[\w.\[\],\s|]+?)\s*:\s*$").expect("valid regex"))
}

fn ts_return_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\)\s*:\s*(?P<type>[\w.\[\]<>]+)\s*\{?\s*$").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotated_param_strips_generics() {
        let types = infer_locals("def f(self, items: List[int]):", "", "proj.a", &SymbolRegistry::new());
        assert_eq!(types.get("items"), Some("List"));
    }

    #[test]
    fn param_matches_class_by_name_heuristic() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.a.Foo", "class");
        let types = infer_locals("def f(self, foo):", "", "proj.a", &registry);
        assert_eq!(types.get("foo"), Some("proj.a.Foo"));
    }

    #[test]
    fn constructor_assignment_infers_type() {
        let types = infer_locals("def f():", "x = Foo()\n", "proj.a", &SymbolRegistry::new());
        assert_eq!(types.get("x"), Some("Foo"));
    }

    #[test]
    fn literal_assignment_infers_primitive() {
        let types = infer_locals("def f():", "x = \"hello\"\n", "proj.a", &SymbolRegistry::new());
        assert_eq!(types.get("x"), Some("str"));
    }

    #[test]
    fn self_attr_assignment_scoped_to_class() {
        let types = infer_locals("def __init__(self):", "tmp = Foo()\nself.thing = tmp\n", "proj.a", &SymbolRegistry::new());
        assert_eq!(types.get_self_attr("thing"), Some("Foo"));
    }

    #[test]
    fn python_return_annotation_is_extracted() {
        assert_eq!(extract_return_type("def session(self) -> Session:"), Some("Session".to_owned()));
    }

    #[test]
    fn python_return_annotation_strips_generics() {
        assert_eq!(extract_return_type("def items(self) -> List[Item]:"), Some("List".to_owned()));
    }

    #[test]
    fn typescript_return_annotation_is_extracted() {
        assert_eq!(extract_return_type("session(): Session {"), Some("Session".to_owned()));
    }

    #[test]
    fn missing_return_annotation_yields_none() {
        assert_eq!(extract_return_type("def f(self, x: int):"), None);
    }
}
