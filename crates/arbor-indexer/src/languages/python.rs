//! Python node tables

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, field_text, node_text};

pub struct PythonHooks;

impl LanguageHooks for PythonHooks {
    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String> {
        match node.kind() {
            "import_from_statement" => field_text(node, "module_name", source).into_iter().collect(),
            _ => {
                let mut cursor = node.walk();
                let names: Vec<String> = node
                    .children_by_field_name("name", &mut cursor)
                    .filter_map(|name| match name.kind() {
                        "aliased_import" => field_text(name, "name", source),
                        _ => node_text(name, source),
                    })
                    .collect();
                names
            }
        }
    }
}

pub fn spec() -> LanguageSpec {
    LanguageSpec {
        language: Language::Python,
        function_kinds: &["function_definition"],
        anonymous_kinds: &[],
        container_kinds: &["class_definition"],
        call_kinds: &["call"],
        import_kinds: &["import_statement", "import_from_statement"],
        hooks: &PythonHooks,
    }
}
