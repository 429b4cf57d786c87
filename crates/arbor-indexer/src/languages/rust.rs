//! Rust node tables

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, collapse_whitespace, field_text, strip_generics};

pub struct RustHooks;

impl LanguageHooks for RustHooks {
    fn container_name(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "impl_item" => field_text(node, "type", source).map(|t| strip_generics(&t)),
            _ => field_text(node, "name", source),
        }
    }

    fn callee(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "macro_invocation" => field_text(node, "macro", source).map(|m| format!("{m}!")),
            _ => field_text(node, "function", source),
        }
    }

    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String> {
        field_text(node, "argument", source)
            .map(|arg| vec![collapse_whitespace(&arg)])
            .unwrap_or_default()
    }

    fn is_async(&self, node: Node<'_>) -> bool {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "function_modifiers" {
                let mut inner = child.walk();
                if child.children(&mut inner).any(|m| m.kind() == "async") {
                    return true;
                }
            }
        }
        false
    }
}

pub fn spec() -> LanguageSpec {
    LanguageSpec {
        language: Language::Rust,
        function_kinds: &["function_item"],
        anonymous_kinds: &[],
        container_kinds: &["impl_item", "trait_item", "mod_item"],
        call_kinds: &["call_expression", "macro_invocation"],
        import_kinds: &["use_declaration"],
        hooks: &RustHooks,
    }
}
