//! Per-language node tables consumed by the generic extractor

use arbor_core::Language;
use tree_sitter::Node;

pub mod c;
pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

/// Which syntax nodes matter for one language. The extractor walks every
/// tree the same way and only consults these tables and hooks.
pub struct LanguageSpec {
    pub language: Language,
    /// Nodes that define a unit. Nodes without a `body` field are skipped.
    pub function_kinds: &'static [&'static str],
    /// Function kinds that may have no name of their own. Only these are
    /// named after the variable or property they are bound to.
    pub anonymous_kinds: &'static [&'static str],
    /// Nodes whose name qualifies the units declared inside them.
    pub container_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    pub import_kinds: &'static [&'static str],
    pub hooks: &'static dyn LanguageHooks,
}

impl LanguageSpec {
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Rust => rust::spec(),
            Language::Python => python::spec(),
            Language::JavaScript => javascript::spec(),
            Language::TypeScript | Language::Tsx => typescript::spec(language),
            Language::Go => go::spec(),
            Language::Java => java::spec(),
            Language::C => c::spec(Language::C),
            Language::Cpp => c::spec(Language::Cpp),
        }
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn is_anonymous_kind(&self, kind: &str) -> bool {
        self.anonymous_kinds.contains(&kind)
    }

    pub fn is_container(&self, kind: &str) -> bool {
        self.container_kinds.contains(&kind)
    }

    pub fn is_call(&self, kind: &str) -> bool {
        self.call_kinds.contains(&kind)
    }

    pub fn is_import(&self, kind: &str) -> bool {
        self.import_kinds.contains(&kind)
    }
}

/// Grammar for a language.
pub fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::Rust => tree_sitter_rust::LANGUAGE.into(),
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        Language::Go => tree_sitter_go::LANGUAGE.into(),
        Language::Java => tree_sitter_java::LANGUAGE.into(),
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
    }
}

/// Language-specific answers to the questions the extractor asks of a node.
/// Defaults cover the common field names.
pub trait LanguageHooks: Send + Sync {
    fn function_name(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        field_text(node, "name", source)
    }

    /// Name a nameless function takes from its binding, as in
    /// `const run = () => {}`.
    fn binding_name(&self, _node: Node<'_>, _source: &[u8]) -> Option<String> {
        None
    }

    fn container_name(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        field_text(node, "name", source)
    }

    /// Extra qualifier for a unit declared outside its owner, such as a Go
    /// method's receiver type.
    fn receiver(&self, _node: Node<'_>, _source: &[u8]) -> Option<String> {
        None
    }

    fn parameters(&self, node: Node<'_>, source: &[u8]) -> String {
        field_text(node, "parameters", source)
            .map(|p| collapse_whitespace(&p))
            .unwrap_or_else(|| "()".to_string())
    }

    /// Raw callee text of a call node.
    fn callee(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        field_text(node, "function", source)
    }

    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String>;

    /// Module loaded by a call such as `require("fs")`.
    fn dynamic_import(&self, _node: Node<'_>, _callee: &str, _source: &[u8]) -> Option<String> {
        None
    }

    fn is_async(&self, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).any(|child| child.kind() == "async");
        found
    }
}

pub(crate) fn node_text(node: Node<'_>, source: &[u8]) -> Option<String> {
    node.utf8_text(source).ok().map(str::to_string)
}

pub(crate) fn field_text(node: Node<'_>, field: &str, source: &[u8]) -> Option<String> {
    node_text(node.child_by_field_name(field)?, source)
}

pub(crate) fn strip_quotes(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '`' | '<' | '>'))
        .to_string()
}

pub(crate) fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Foo<T>` and `Foo[T]` become `Foo`.
pub(crate) fn strip_generics(raw: &str) -> String {
    let end = raw.find(['<', '[']).unwrap_or(raw.len());
    raw[..end].trim().to_string()
}
