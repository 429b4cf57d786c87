//! Java node tables

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, collapse_whitespace, field_text, node_text, strip_generics};

pub struct JavaHooks;

impl LanguageHooks for JavaHooks {
    fn callee(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "object_creation_expression" => field_text(node, "type", source).map(|t| strip_generics(&t)),
            _ => {
                let name = field_text(node, "name", source)?;
                match field_text(node, "object", source) {
                    Some(object) => Some(format!("{object}.{name}")),
                    None => Some(name),
                }
            }
        }
    }

    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String> {
        let Some(text) = node_text(node, source) else {
            return Vec::new();
        };
        let path = text.trim().trim_start_matches("import").trim();
        let path = path.strip_prefix("static ").unwrap_or(path).trim_end_matches(';');
        vec![collapse_whitespace(path)]
    }

    fn is_async(&self, _node: Node<'_>) -> bool {
        false
    }
}

pub fn spec() -> LanguageSpec {
    LanguageSpec {
        language: Language::Java,
        function_kinds: &["method_declaration", "constructor_declaration"],
        anonymous_kinds: &[],
        container_kinds: &[
            "class_declaration",
            "interface_declaration",
            "enum_declaration",
            "record_declaration",
        ],
        call_kinds: &["method_invocation", "object_creation_expression"],
        import_kinds: &["import_declaration"],
        hooks: &JavaHooks,
    }
}
