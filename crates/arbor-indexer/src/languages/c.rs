//! C and C++ node tables

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, collapse_whitespace, field_text, node_text, strip_quotes};

pub struct CFamilyHooks;

/// Follow the declarator chain of a definition down to its
/// `function_declarator`, through pointer and reference wrappers.
fn function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.child_by_field_name("declarator")?;
    for _ in 0..8 {
        if current.kind() == "function_declarator" {
            return Some(current);
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| current.named_child(0))?;
    }
    None
}

impl LanguageHooks for CFamilyHooks {
    fn function_name(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        let declarator = function_declarator(node)?;
        node_text(declarator.child_by_field_name("declarator")?, source)
    }

    fn parameters(&self, node: Node<'_>, source: &[u8]) -> String {
        function_declarator(node)
            .and_then(|d| field_text(d, "parameters", source))
            .map(|p| collapse_whitespace(&p))
            .unwrap_or_else(|| "()".to_string())
    }

    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String> {
        field_text(node, "path", source)
            .map(|p| vec![strip_quotes(&p)])
            .unwrap_or_default()
    }

    fn is_async(&self, _node: Node<'_>) -> bool {
        false
    }
}

pub fn spec(language: Language) -> LanguageSpec {
    let container_kinds: &'static [&'static str] = match language {
        Language::Cpp => &["class_specifier", "struct_specifier", "namespace_definition"],
        _ => &[],
    };
    LanguageSpec {
        language,
        function_kinds: &["function_definition"],
        anonymous_kinds: &[],
        container_kinds,
        call_kinds: &["call_expression"],
        import_kinds: &["preproc_include"],
        hooks: &CFamilyHooks,
    }
}
