//! JavaScript node tables, shared with TypeScript

use arbor_core::Language;
use tree_sitter::Node;

use super::{LanguageHooks, LanguageSpec, collapse_whitespace, field_text, node_text, strip_quotes};

pub(crate) const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
    "arrow_function",
    "function_expression",
    "generator_function",
];

pub(crate) const ANONYMOUS_KINDS: &[&str] =
    &["arrow_function", "function_expression", "generator_function"];

pub struct EcmaHooks;

impl LanguageHooks for EcmaHooks {
    fn binding_name(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        let parent = node.parent()?;
        match parent.kind() {
            "variable_declarator" => {
                let name = parent.child_by_field_name("name")?;
                (name.kind() == "identifier").then(|| node_text(name, source)).flatten()
            }
            "assignment_expression" => {
                let left = field_text(parent, "left", source)?;
                left.rsplit('.').next().map(str::to_string)
            }
            "pair" => field_text(parent, "key", source).map(|k| strip_quotes(&k)),
            "field_definition" | "public_field_definition" => field_text(parent, "property", source)
                .or_else(|| field_text(parent, "name", source)),
            _ => None,
        }
    }

    fn parameters(&self, node: Node<'_>, source: &[u8]) -> String {
        if let Some(params) = field_text(node, "parameters", source) {
            return collapse_whitespace(&params);
        }
        match field_text(node, "parameter", source) {
            Some(single) => format!("({single})"),
            None => "()".to_string(),
        }
    }

    fn callee(&self, node: Node<'_>, source: &[u8]) -> Option<String> {
        match node.kind() {
            "new_expression" => field_text(node, "constructor", source),
            _ => field_text(node, "function", source),
        }
    }

    fn imports(&self, node: Node<'_>, source: &[u8]) -> Vec<String> {
        field_text(node, "source", source)
            .map(|s| vec![strip_quotes(&s)])
            .unwrap_or_default()
    }

    fn dynamic_import(&self, node: Node<'_>, callee: &str, source: &[u8]) -> Option<String> {
        if callee != "require" {
            return None;
        }
        let arguments = node.child_by_field_name("arguments")?;
        let first = arguments.named_child(0)?;
        (first.kind() == "string")
            .then(|| node_text(first, source))
            .flatten()
            .map(|s| strip_quotes(&s))
    }
}

pub fn spec() -> LanguageSpec {
    LanguageSpec {
        language: Language::JavaScript,
        function_kinds: FUNCTION_KINDS,
        anonymous_kinds: ANONYMOUS_KINDS,
        container_kinds: &["class_declaration", "class"],
        call_kinds: &["call_expression", "new_expression"],
        import_kinds: &["import_statement"],
        hooks: &EcmaHooks,
    }
}
