//! Go node tables

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, field_text, strip_generics, strip_quotes};

pub struct GoHooks;

impl LanguageHooks for GoHooks {
    fn receiver(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        let receiver = node.child_by_field_name("receiver")?;
        let param = receiver.named_child(0)?;
        let ty = field_text(param, "type", source)?;
        Some(strip_generics(ty.trim_start_matches('*')))
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

pub fn spec() -> LanguageSpec {
    LanguageSpec {
        language: Language::Go,
        function_kinds: &["function_declaration", "method_declaration", "func_literal"],
        anonymous_kinds: &["func_literal"],
        container_kinds: &[],
        call_kinds: &["call_expression"],
        import_kinds: &["import_spec"],
        hooks: &GoHooks,
    }
}
