//! Per-language tree-sitter node-type configuration (§4.2).
//!
//! Each language's grammar names its syntax nodes differently; rather than
//! hand-write a visitor per language, extraction in [`crate::parser`] walks
//! the tree generically and asks a [`LanguageConfig`] whether a given node
//! kind is a function, a class, a call, or an import. Adding a language is
//! adding a table row, not a new code path.

use codegraph_domain::value_objects::Language;
use tree_sitter::Language as TsLanguage;

/// The node-kind sets that drive generic entity extraction for one
/// language.
pub struct LanguageConfig {
    /// The tree-sitter grammar.
    pub ts_language: TsLanguage,
    /// Node kinds that introduce a function (not a method).
    pub function_kinds: &'static [&'static str],
    /// Node kinds that introduce a class (or class-like construct: a Rust
    /// `impl` block, a Go/C `struct`).
    pub class_kinds: &'static [&'static str],
    /// Node kinds that introduce a method — only consulted for direct
    /// children of a class body; everything else nested there is ignored.
    pub method_kinds: &'static [&'static str],
    /// Node kinds that are call expressions.
    pub call_kinds: &'static [&'static str],
    /// Node kinds that are import/use statements.
    pub import_kinds: &'static [&'static str],
    /// Node kind for a string literal (used to find docstrings).
    pub string_kinds: &'static [&'static str],
    /// Whether the first string-literal statement in a function/class body
    /// is treated as a docstring (Python convention).
    pub leading_string_is_docstring: bool,
}

/// Look up the extraction configuration for `language`.
#[must_use]
pub fn config_for(language: Language) -> LanguageConfig {
    match language {
        Language::Python => LanguageConfig {
            ts_language: tree_sitter_python::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            class_kinds: &["class_definition"],
            method_kinds: &["function_definition"],
            call_kinds: &["call"],
            import_kinds: &["import_statement", "import_from_statement"],
            string_kinds: &["string"],
            leading_string_is_docstring: true,
        },
        Language::JavaScript | Language::Jsx => LanguageConfig {
            ts_language: tree_sitter_javascript::LANGUAGE.into(),
            function_kinds: &["function_declaration", "generator_function_declaration"],
            class_kinds: &["class_declaration"],
            method_kinds: &["method_definition"],
            call_kinds: &["call_expression"],
            import_kinds: &["import_statement"],
            string_kinds: &["string"],
            leading_string_is_docstring: false,
        },
        Language::TypeScript => LanguageConfig {
            ts_language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            function_kinds: &["function_declaration", "generator_function_declaration"],
            class_kinds: &["class_declaration", "interface_declaration"],
            method_kinds: &["method_definition", "method_signature"],
            call_kinds: &["call_expression"],
            import_kinds: &["import_statement"],
            string_kinds: &["string"],
            leading_string_is_docstring: false,
        },
        Language::Tsx => LanguageConfig {
            ts_language: tree_sitter_typescript::LANGUAGE_TSX.into(),
            function_kinds: &["function_declaration", "generator_function_declaration"],
            class_kinds: &["class_declaration", "interface_declaration"],
            method_kinds: &["method_definition", "method_signature"],
            call_kinds: &["call_expression"],
            import_kinds: &["import_statement"],
            string_kinds: &["string"],
            leading_string_is_docstring: false,
        },
        Language::Rust => LanguageConfig {
            ts_language: tree_sitter_rust::LANGUAGE.into(),
            function_kinds: &["function_item"],
            class_kinds: &["struct_item", "impl_item", "trait_item"],
            method_kinds: &["function_item"],
            call_kinds: &["call_expression"],
            import_kinds: &["use_declaration"],
            string_kinds: &["string_literal"],
            leading_string_is_docstring: false,
        },
        Language::Java => LanguageConfig {
            ts_language: tree_sitter_java::LANGUAGE.into(),
            function_kinds: &[],
            class_kinds: &["class_declaration", "interface_declaration"],
            method_kinds: &["method_declaration", "constructor_declaration"],
            call_kinds: &["method_invocation", "object_creation_expression"],
            import_kinds: &["import_declaration"],
            string_kinds: &["string_literal"],
            leading_string_is_docstring: false,
        },
        Language::Go => LanguageConfig {
            ts_language: tree_sitter_go::LANGUAGE.into(),
            function_kinds: &["function_declaration"],
            class_kinds: &["type_declaration"],
            method_kinds: &["method_declaration"],
            call_kinds: &["call_expression"],
            import_kinds: &["import_declaration"],
            string_kinds: &["interpreted_string_literal", "raw_string_literal"],
            leading_string_is_docstring: false,
        },
        Language::Cpp => LanguageConfig {
            ts_language: tree_sitter_cpp::LANGUAGE.into(),
            function_kinds: &["function_definition"],
            class_kinds: &["class_specifier", "struct_specifier"],
            method_kinds: &["function_definition"],
            call_kinds: &["call_expression"],
            import_kinds: &["preproc_include"],
            string_kinds: &["string_literal"],
            leading_string_is_docstring: false,
        },
    }
}
