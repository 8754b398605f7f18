//! Call resolver (§4.7): an 8-strategy ladder turning a raw call-site
//! string into `(kind, qn)`, trying each strategy in order and returning
//! the first whose `qn` is in the symbol registry.

use crate::imports::ImportProcessor;
use crate::inheritance::InheritanceTracker;
use crate::registry::{Kind, SymbolRegistry};
use crate::type_inference::LocalTypes;

/// Everything the call resolver needs to resolve one raw call-site string,
/// borrowed for the duration of the call.
pub struct ResolverContext<'a> {
    pub registry: &'a SymbolRegistry,
    pub imports: &'a ImportProcessor,
    pub inheritance: &'a InheritanceTracker,
    pub caller_module_qn: &'a str,
    pub class_context: Option<&'a str>,
    pub local_var_types: Option<&'a LocalTypes>,
}

/// A resolved callee: its qualified name and registry kind, or `builtin`
/// for language builtins (no registry entry, no graph edge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Entity { qn: String, kind: Kind },
    Builtin { qn: String },
}

const CPP_OPERATORS: &[(&str, &str)] = &[
    ("operator+", "builtin.operator_add"),
    ("operator-", "builtin.operator_sub"),
    ("operator*", "builtin.operator_mul"),
    ("operator/", "builtin.operator_div"),
    ("operator==", "builtin.operator_eq"),
    ("operator[]", "builtin.operator_index"),
    ("operator<<", "builtin.operator_shl"),
    ("operator>>", "builtin.operator_shr"),
];

fn python_builtins() -> &'static [&'static str] {
    &["print", "len", "range", "str", "int", "float", "list", "dict", "set", "tuple", "bool", "open", "isinstance", "super", "enumerate", "zip", "map", "filter"]
}

fn js_builtins() -> &'static [&'static str] {
    &["console.log", "Array.isArray", "Object.keys", "Object.values", "JSON.parse", "JSON.stringify", "parseInt", "parseFloat", "setTimeout", "setInterval"]
}

/// Resolve `raw_call` made from `ctx.caller_module_qn` (optionally inside
/// `ctx.class_context`), trying each strategy in §4.7's order.
#[must_use]
pub fn resolve(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    try_iife(raw_call, ctx)
        .or_else(|| try_super_call(raw_call, ctx))
        .or_else(|| try_cpp_operator(raw_call, ctx))
        .or_else(|| try_method_chain(raw_call, ctx))
        .or_else(|| try_direct_import(raw_call, ctx))
        .or_else(|| try_same_module(raw_call, ctx))
        .or_else(|| try_builtin(raw_call))
        .or_else(|| try_fallback_by_simple_name(raw_call, ctx))
}

fn entity_if_registered(registry: &SymbolRegistry, qn: &str) -> Option<Resolved> {
    registry.get(qn).map(|kind| Resolved::Entity { qn: qn.to_owned(), kind })
}

fn try_iife(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    if !(raw_call.starts_with("iife_func_") || raw_call.starts_with("iife_arrow_")) {
        return None;
    }
    entity_if_registered(ctx.registry, &format!("{}.{raw_call}", ctx.caller_module_qn))
}

fn try_super_call(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    let trimmed = raw_call.trim();
    let is_super = trimmed == "super" || trimmed == "super()" || trimmed.starts_with("super(") || trimmed.starts_with("super.");
    if !is_super {
        return None;
    }
    let class_context = ctx.class_context?;
    let method = trimmed
        .split_once("().")
        .map(|(_, m)| m)
        .or_else(|| trimmed.split_once("super.").map(|(_, m)| m))
        .unwrap_or("__init__");

    for ancestor in ctx.inheritance.mro(class_context).into_iter().skip(1) {
        let candidate = format!("{ancestor}.{method}");
        if let Some(resolved) = entity_if_registered(ctx.registry, &candidate) {
            return Some(resolved);
        }
        if method == "__init__" {
            let ctor_candidate = format!("{ancestor}.constructor");
            if let Some(resolved) = entity_if_registered(ctx.registry, &ctor_candidate) {
                return Some(resolved);
            }
        }
    }
    None
}

fn try_cpp_operator(raw_call: &str, _ctx: &ResolverContext) -> Option<Resolved> {
    let base = raw_call.split('(').next().unwrap_or(raw_call);
    if let Some((_, builtin_qn)) = CPP_OPERATORS.iter().find(|(op, _)| *op == base) {
        return Some(Resolved::Builtin { qn: (*builtin_qn).to_owned() });
    }
    None
}

/// Bounds the recursion in [`infer_receiver_type`] so a pathological chain
/// (or a cyclic return-type annotation) can't recurse unboundedly.
const MAX_CHAIN_DEPTH: usize = 8;

fn try_method_chain(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    if !raw_call.contains(").") {
        return None;
    }
    let (receiver_expr, method) = raw_call.rsplit_once('.')?;
    let method = method.trim_end_matches("()");

    let receiver_type = infer_receiver_type(receiver_expr, ctx, MAX_CHAIN_DEPTH)?;
    let direct = format!("{receiver_type}.{method}");
    if let Some(resolved) = entity_if_registered(ctx.registry, &direct) {
        return Some(resolved);
    }
    for ancestor in ctx.inheritance.mro(&receiver_type) {
        let candidate = format!("{ancestor}.{method}");
        if let Some(resolved) = entity_if_registered(ctx.registry, &candidate) {
            return Some(resolved);
        }
    }
    None
}

/// Infer `receiver_expr`'s qualified type. When the receiver is itself a
/// call (`a.b()`), recurse into its own receiver's type, resolve the called
/// method, and return its declared return type (§4.6) — bounded by `depth`.
fn infer_receiver_type(receiver_expr: &str, ctx: &ResolverContext, depth: usize) -> Option<String> {
    if depth == 0 {
        return None;
    }
    let receiver_expr = receiver_expr.trim();

    if let Some(inner) = receiver_expr.strip_suffix("()") {
        let (inner_receiver, inner_method) = inner.rsplit_once('.')?;
        let inner_receiver_type = infer_receiver_type(inner_receiver, ctx, depth - 1)?;
        return resolve_method_return_type(&inner_receiver_type, inner_method, ctx);
    }

    let trimmed = receiver_expr.trim_end_matches(')');
    let raw_type = if let Some((base, attr)) = trimmed.rsplit_once('.') {
        if base == "self" {
            ctx.local_var_types.and_then(|t| t.get_self_attr(attr))
        } else {
            ctx.local_var_types.and_then(|t| t.get(trimmed))
        }
    } else {
        ctx.local_var_types.and_then(|t| t.get(trimmed))
    }?;

    Some(qualify_type(raw_type, ctx))
}

/// Look up `receiver_type.method`'s declared return type, walking MRO on a
/// registry miss exactly like [`try_method_chain`]'s own entity resolution.
fn resolve_method_return_type(receiver_type: &str, method: &str, ctx: &ResolverContext) -> Option<String> {
    let direct = format!("{receiver_type}.{method}");
    if let Some(return_type) = ctx.registry.return_type(&direct) {
        return Some(qualify_type(return_type, ctx));
    }
    for ancestor in ctx.inheritance.mro(receiver_type) {
        let candidate = format!("{ancestor}.{method}");
        if let Some(return_type) = ctx.registry.return_type(&candidate) {
            return Some(qualify_type(return_type, ctx));
        }
    }
    None
}

/// Resolve a possibly-unqualified class name against the caller's import
/// mapping, then the registry by simple name (preferring a candidate in the
/// caller's own module), falling back to the raw name — the same pattern
/// `InheritanceTracker::record_class` uses for base classes.
fn qualify_type(raw_type: &str, ctx: &ResolverContext) -> String {
    if ctx.registry.get(raw_type).is_some() {
        return raw_type.to_owned();
    }
    if let Some(qn) = ctx.imports.mapping_for(ctx.caller_module_qn).and_then(|m| m.0.get(raw_type)) {
        return qn.clone();
    }
    let candidates = ctx.registry.find_by_simple_name(raw_type);
    candidates.iter().find(|qn| qn.starts_with(ctx.caller_module_qn)).or_else(|| candidates.first()).cloned().unwrap_or_else(|| raw_type.to_owned())
}

fn try_direct_import(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    let first_segment = raw_call.split(['.', '(']).next().unwrap_or(raw_call);
    let mapping = ctx.imports.mapping_for(ctx.caller_module_qn)?;
    let base = mapping.0.get(first_segment)?;

    let rest = raw_call.strip_prefix(first_segment).unwrap_or("").trim_start_matches('.').trim_end_matches("()");
    let candidate = if rest.is_empty() { base.clone() } else { format!("{base}.{rest}") };

    if let Some(resolved) = entity_if_registered(ctx.registry, &candidate) {
        return Some(resolved);
    }
    for ancestor in ctx.inheritance.mro(base) {
        let candidate = format!("{ancestor}.{rest}");
        if let Some(resolved) = entity_if_registered(ctx.registry, &candidate) {
            return Some(resolved);
        }
    }
    None
}

fn try_same_module(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    let first_segment = raw_call.split(['.', '(']).next().unwrap_or(raw_call);
    entity_if_registered(ctx.registry, &format!("{}.{first_segment}", ctx.caller_module_qn))
}

fn try_builtin(raw_call: &str) -> Option<Resolved> {
    let base = raw_call.split('(').next().unwrap_or(raw_call);
    if python_builtins().contains(&base) || js_builtins().contains(&base) {
        return Some(Resolved::Builtin { qn: format!("builtin.{base}") });
    }
    None
}

fn try_fallback_by_simple_name(raw_call: &str, ctx: &ResolverContext) -> Option<Resolved> {
    let last_segment = raw_call.trim_end_matches("()").rsplit('.').next().unwrap_or(raw_call);
    let candidates = ctx.registry.find_by_simple_name(last_segment);
    if candidates.is_empty() {
        return None;
    }

    let best = candidates.into_iter().min_by_key(|qn| module_distance(ctx.caller_module_qn, qn))?;
    ctx.registry.get(&best).map(|kind| Resolved::Entity { qn: best, kind })
}

/// Lower is closer: shared-prefix segment count subtracted from a base
/// distance, with a same-module bonus per §4.7.
fn module_distance(caller_module_qn: &str, candidate_qn: &str) -> i32 {
    let caller_segments: Vec<&str> = caller_module_qn.split('.').collect();
    let candidate_segments: Vec<&str> = candidate_qn.split('.').collect();

    let shared = caller_segments.iter().zip(candidate_segments.iter()).take_while(|(a, b)| a == b).count();
    let bonus = if candidate_qn.starts_with(caller_module_qn) { -5 } else { 0 };

    100 - (shared as i32) * 10 + bonus
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::imports::ImportProcessor;
    use crate::inheritance::InheritanceTracker;

    fn empty_ctx<'a>(registry: &'a SymbolRegistry, imports: &'a ImportProcessor, inheritance: &'a InheritanceTracker, module_qn: &'a str) -> ResolverContext<'a> {
        ResolverContext { registry, imports, inheritance, caller_module_qn: module_qn, class_context: None, local_var_types: None }
    }

    #[test]
    fn same_module_strategy_resolves_sibling_function() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.a.helper", "function");
        let imports = ImportProcessor::new();
        let inheritance = InheritanceTracker::new();
        let ctx = empty_ctx(&registry, &imports, &inheritance, "proj.a");

        assert_eq!(resolve("helper()", &ctx), Some(Resolved::Entity { qn: "proj.a.helper".to_owned(), kind: "function" }));
    }

    #[test]
    fn builtin_strategy_returns_synthetic_qn_when_unregistered() {
        let registry = SymbolRegistry::new();
        let imports = ImportProcessor::new();
        let inheritance = InheritanceTracker::new();
        let ctx = empty_ctx(&registry, &imports, &inheritance, "proj.a");

        assert_eq!(resolve("len(x)", &ctx), Some(Resolved::Builtin { qn: "builtin.len".to_owned() }));
    }

    #[test]
    fn super_call_resolves_to_nearest_ancestor_method() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.a.Base.greet", "method");
        let imports = ImportProcessor::new();

        let mut tracker = InheritanceTracker::new();
        let child_qn = codegraph_domain::value_objects::QualifiedName::new("proj.a.Child");
        tracker.record_class(&child_qn, &["Base".to_owned()], "proj.a", &registry, |_, _| Some("proj.a.Base".to_owned()));

        let ctx = ResolverContext {
            registry: &registry,
            imports: &imports,
            inheritance: &tracker,
            caller_module_qn: "proj.a",
            class_context: Some("proj.a.Child"),
            local_var_types: None,
        };
        assert_eq!(resolve("super().greet()", &ctx), Some(Resolved::Entity { qn: "proj.a.Base.greet".to_owned(), kind: "method" }));
    }

    #[test]
    fn direct_import_hit_resolves_through_mapping() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.b.Thing.run", "method");
        let mut imports = ImportProcessor::new();
        imports.process_python("proj.a", "from b import Thing", "proj");
        let inheritance = InheritanceTracker::new();
        let ctx = empty_ctx(&registry, &imports, &inheritance, "proj.a");

        assert_eq!(resolve("Thing.run()", &ctx), Some(Resolved::Entity { qn: "proj.b.Thing.run".to_owned(), kind: "method" }));
    }

    #[test]
    fn method_chain_recurses_through_chained_call_return_type() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.db.Repo.session", "method");
        registry.register_return_type("proj.db.Repo.session", "Session");
        registry.register("proj.db.Session.commit", "method");

        let mut imports = ImportProcessor::new();
        imports.process_python("proj.svc", "from db import Repo", "proj");

        let inheritance = InheritanceTracker::new();
        let locals = LocalTypes { locals: [("x".to_owned(), "Repo".to_owned())].into_iter().collect(), self_attrs: HashMap::new() };
        let ctx = ResolverContext {
            registry: &registry,
            imports: &imports,
            inheritance: &inheritance,
            caller_module_qn: "proj.svc",
            class_context: None,
            local_var_types: Some(&locals),
        };

        assert_eq!(resolve("x.session().commit()", &ctx), Some(Resolved::Entity { qn: "proj.db.Session.commit".to_owned(), kind: "method" }));
    }

    #[test]
    fn deeply_nested_chain_terminates_without_resolving() {
        let registry = SymbolRegistry::new();
        let imports = ImportProcessor::new();
        let inheritance = InheritanceTracker::new();
        let ctx = empty_ctx(&registry, &imports, &inheritance, "proj.svc");

        assert_eq!(infer_receiver_type("x.a().b().c().d()", &ctx, MAX_CHAIN_DEPTH), None);
    }

    #[test]
    fn depth_guard_of_zero_yields_none_immediately() {
        let registry = SymbolRegistry::new();
        let imports = ImportProcessor::new();
        let inheritance = InheritanceTracker::new();
        let locals = LocalTypes { locals: [("x".to_owned(), "Foo".to_owned())].into_iter().collect(), self_attrs: HashMap::new() };
        let ctx = ResolverContext { registry: &registry, imports: &imports, inheritance: &inheritance, caller_module_qn: "proj.svc", class_context: None, local_var_types: Some(&locals) };

        assert_eq!(infer_receiver_type("x", &ctx, 0), None);
    }

    #[test]
    fn fallback_by_simple_name_prefers_closer_module() {
        let mut registry = SymbolRegistry::new();
        registry.register("proj.far.unrelated.helper", "function");
        registry.register("proj.a.sibling.helper", "function");
        let imports = ImportProcessor::new();
        let inheritance = InheritanceTracker::new();
        let ctx = empty_ctx(&registry, &imports, &inheritance, "proj.a");

        assert_eq!(resolve("helper()", &ctx).map(|r| matches!(r, Resolved::Entity { qn, .. } if qn == "proj.a.sibling.helper")), Some(true));
    }
}
