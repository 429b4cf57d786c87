//! TypeScript and TSX node tables

use arbor_core::Language;

use super::LanguageSpec;
use super::javascript::{ANONYMOUS_KINDS, EcmaHooks, FUNCTION_KINDS};

pub fn spec(language: Language) -> LanguageSpec {
    LanguageSpec {
        language,
        function_kinds: FUNCTION_KINDS,
        anonymous_kinds: ANONYMOUS_KINDS,
        container_kinds: &["class_declaration", "abstract_class_declaration", "class"],
        call_kinds: &["call_expression", "new_expression"],
        import_kinds: &["import_statement"],
        hooks: &EcmaHooks,
    }
}
