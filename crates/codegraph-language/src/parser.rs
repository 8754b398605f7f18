//! Tree-sitter parser + entity/import extraction (§4.2).
//!
//! `parse_file` is the `parse_file(FileInfo) → ParsedFile | error` contract:
//! CPU-bound, intended to run inside a worker pool (§5), and driven entirely
//! by the language's [`LanguageConfig`] node-kind tables rather than a
//! bespoke visitor per language.

use std::path::Path;

use codegraph_domain::entities::{CodeEntity, EntityKind, FileInfo, ImportRecord};
use codegraph_domain::value_objects::QualifiedName;
use codegraph_domain::{Error, Result};
use tree_sitter::{Node, Parser, Tree};

use crate::config::{self, LanguageConfig};

/// The result of parsing one file: its entity tree, its imports, and the
/// raw syntax tree (kept for the resolver's type-inference pass, §4.6).
pub struct ParsedFile {
    pub file_info: FileInfo,
    pub entities: Vec<CodeEntity>,
    pub imports: Vec<ImportRecord>,
    pub tree: Tree,
}

/// Parse `source` (the bytes of `file_info.absolute_path`) into a
/// [`ParsedFile`], with entity qualified names rooted at
/// `project_name.<module path>`.
pub fn parse_file(file_info: &FileInfo, source: &[u8], project_name: &str) -> Result<ParsedFile> {
    let config = config::config_for(file_info.language);

    let mut parser = Parser::new();
    parser.set_language(&config.ts_language).map_err(|err| Error::parse(file_info.absolute_path.display().to_string(), err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| Error::parse(file_info.absolute_path.display().to_string(), "tree-sitter returned no tree".to_owned()))?;

    let module_qn = QualifiedName::for_module(project_name, &file_info.relative_path);
    let root = tree.root_node();

    let mut entities = Vec::new();
    let mut imports = Vec::new();
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        if config.class_kinds.contains(&child.kind()) {
            if let Some(entity) = extract_class(child, source, &config, &module_qn, &file_info.relative_path) {
                entities.push(entity);
            }
        } else if config.function_kinds.contains(&child.kind()) {
            if let Some(entity) = extract_function(child, source, &config, &module_qn, None, &file_info.relative_path) {
                entities.push(entity);
            }
        } else if config.import_kinds.contains(&child.kind()) {
            imports.push(extract_import(child, source));
        }
    }

    for entity in &mut entities {
        entity.dedupe_calls();
    }

    Ok(ParsedFile { file_info: file_info.clone(), entities, imports, tree })
}

fn extract_class(node: Node, source: &[u8], config: &LanguageConfig, module_qn: &QualifiedName, file_path: &Path) -> Option<CodeEntity> {
    let name = node_name(node, source)?;
    let class_qn = module_qn.child(&name);

    let base_classes = extract_base_classes(node, source);

    let mut children = Vec::new();
    if let Some(body) = node.child_by_field_name("body").or_else(|| find_block_child(node)) {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if config.method_kinds.contains(&member.kind()) {
                if let Some(method) = extract_function(member, source, config, module_qn, Some(&class_qn), file_path) {
                    children.push(method);
                }
            }
        }
    }

    Some(CodeEntity {
        name,
        qualified_name: class_qn,
        signature: first_line(node, source),
        docstring: config.leading_string_is_docstring.then(|| leading_docstring(node, source, config)).flatten(),
        code: node_text(node, source),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        file_path: file_path.to_path_buf(),
        kind: EntityKind::Class { base_classes, children },
    })
}

fn extract_function(
    node: Node,
    source: &[u8],
    config: &LanguageConfig,
    module_qn: &QualifiedName,
    parent_class: Option<&QualifiedName>,
    file_path: &Path,
) -> Option<CodeEntity> {
    let name = node_name(node, source)?;
    let qualified_name = parent_class.unwrap_or(module_qn).child(&name);
    let is_async = node_text(node, source).trim_start().starts_with("async");
    let calls = collect_calls(node, source, config);

    let kind = match parent_class {
        Some(parent_class) => EntityKind::Method {
            is_async,
            calls,
            parent_class: parent_class.clone(),
            is_static: has_modifier(node, source, "static"),
            is_classmethod: has_modifier(node, source, "classmethod"),
        },
        None => EntityKind::Function { is_async, calls },
    };

    Some(CodeEntity {
        name,
        qualified_name,
        signature: first_line(node, source),
        docstring: config.leading_string_is_docstring.then(|| leading_docstring(node, source, config)).flatten(),
        code: node_text(node, source),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
        file_path: file_path.to_path_buf(),
        kind,
    })
}

fn extract_import(node: Node, source: &[u8]) -> ImportRecord {
    ImportRecord {
        name: node_text(node, source).trim().to_owned(),
        alias: None,
        source_module: node_text(node, source).trim().to_owned(),
        is_external: true,
        line_number: node.start_position().row + 1,
    }
}

fn extract_base_classes(node: Node, source: &[u8]) -> Vec<String> {
    // Covers Python's `class C(Base1, Base2):`, JS/TS's `class C extends
    // Base`, and Java's `class C extends Base implements I1, I2`.
    ["superclasses", "class_heritage", "superclass", "interfaces"]
        .into_iter()
        .filter_map(|field| node.child_by_field_name(field))
        .flat_map(|clause| {
            let mut cursor = clause.walk();
            clause.children(&mut cursor).filter(|c| c.is_named()).map(|c| node_text(c, source)).collect::<Vec<_>>()
        })
        .collect()
}

fn collect_calls(node: Node, source: &[u8], config: &LanguageConfig) -> Vec<String> {
    let mut calls = Vec::new();
    walk_calls(node, source, config, &mut calls);
    calls
}

fn walk_calls(node: Node, source: &[u8], config: &LanguageConfig, out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if config.call_kinds.contains(&child.kind()) {
            let callee = child
                .child_by_field_name("function")
                .or_else(|| child.child_by_field_name("method"))
                .or_else(|| child.named_child(0))
                .map(|n| node_text(n, source))
                .unwrap_or_else(|| node_text(child, source));
            out.push(callee);
        }
        walk_calls(child, source, config, out);
    }
}

fn has_modifier(node: Node, source: &[u8], modifier: &str) -> bool {
    node.child_by_field_name("modifiers").is_some_and(|m| node_text(m, source).contains(modifier)) || first_line(node, source).contains(modifier)
}

fn leading_docstring(node: Node, source: &[u8], config: &LanguageConfig) -> Option<String> {
    let body = node.child_by_field_name("body").or_else(|| find_block_child(node))?;
    let first_stmt = body.named_child(0)?;
    let string_node = if config.string_kinds.contains(&first_stmt.kind()) {
        first_stmt
    } else {
        first_stmt.named_child(0).filter(|c| config.string_kinds.contains(&c.kind()))?
    };
    Some(node_text(string_node, source).trim_matches(['"', '\'']).trim().to_owned())
}

fn find_block_child<'a>(node: Node<'a>) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind().ends_with("block") || c.kind() == "body")
}

fn node_name(node: Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("name").map(|n| node_text(n, source))
}

fn node_text(node: Node, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_owned()
}

fn first_line(node: Node, source: &[u8]) -> String {
    node_text(node, source).lines().next().unwrap_or_default().trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_domain::value_objects::Language;
    use std::path::PathBuf;

    fn file_info(relative: &str, language: Language, source: &[u8]) -> FileInfo {
        FileInfo::from_bytes(PathBuf::from("/repo").join(relative), PathBuf::from(relative), language, source)
    }

    #[test]
    fn extracts_python_class_with_method_and_call() {
        let source = b"class Foo:\n    def bar(self):\n        pass\n\ndef g():\n    Foo().bar()\n";
        let info = file_info("a.py", Language::Python, source);
        let parsed = parse_file(&info, source, "proj").expect("parse succeeds");

        assert_eq!(parsed.entities.len(), 2);
        let class = &parsed.entities[0];
        assert_eq!(class.name, "Foo");
        assert_eq!(class.qualified_name.as_str(), "proj.a.Foo");

        let EntityKind::Class { children, .. } = &class.kind else { panic!("expected class") };
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].qualified_name.as_str(), "proj.a.Foo.bar");

        let function = &parsed.entities[1];
        let EntityKind::Function { calls, .. } = &function.kind else { panic!("expected function") };
        assert!(calls.iter().any(|c| c.contains("bar")));
    }

    #[test]
    fn extracts_python_imports() {
        let source = b"import os\nfrom a.b import c\n\ndef f():\n    pass\n";
        let info = file_info("m.py", Language::Python, source);
        let parsed = parse_file(&info, source, "proj").expect("parse succeeds");

        assert_eq!(parsed.imports.len(), 2);
    }

    #[test]
    fn docstring_is_first_string_statement() {
        let source = b"def f():\n    \"\"\"does a thing\"\"\"\n    pass\n";
        let info = file_info("m.py", Language::Python, source);
        let parsed = parse_file(&info, source, "proj").expect("parse succeeds");

        assert_eq!(parsed.entities[0].docstring.as_deref(), Some("does a thing"));
    }
}
