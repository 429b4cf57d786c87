//! Generic unit extraction driven by a `LanguageSpec`

use std::collections::HashSet;
use std::rc::Rc;

use arbor_core::{HashAlgorithm, Language};
use tree_sitter::{Node, Tree};

use crate::languages::LanguageSpec;

/// Display name of a unit with no name of its own.
pub const ANONYMOUS: &str = "<anonymous>";

const MAX_CALLEE_LEN: usize = 120;

/// One analysis unit as produced by the parser layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUnit {
    /// Unique key within the file: the qualified name, or the start line for
    /// anonymous units. Doubles as the manifest key.
    pub key: String,
    pub name: String,
    pub qualified_name: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
    pub byte_size: u64,
    pub source: String,
    /// Digest of the whitespace-normalized source.
    pub hash: String,
    pub parameters: String,
    pub is_async: bool,
    /// The unit's own syntax tree contains errors or missing nodes.
    pub has_error: bool,
    /// Callee names in first-seen order, without duplicates.
    pub calls: Vec<String>,
}

impl ExtractedUnit {
    pub fn identifier(&self, file: &str) -> String {
        format!("{file}#{}", self.key)
    }

    pub fn is_anonymous(&self) -> bool {
        self.qualified_name.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub path: String,
    pub language: Language,
    /// Units in source order.
    pub units: Vec<ExtractedUnit>,
    pub imports: Vec<String>,
}

impl ExtractedFile {
    pub fn unit(&self, key: &str) -> Option<&ExtractedUnit> {
        self.units.iter().find(|u| u.key == key)
    }
}

struct Frame<'tree> {
    node: Node<'tree>,
    scope: Option<Rc<str>>,
    owner: Option<usize>,
}

/// Walk `tree` with an explicit stack, collecting units, their calls, and the
/// file's imports. Nested functions become units of their own and own the
/// calls made inside them.
pub(crate) fn extract(
    spec: &LanguageSpec,
    tree: &Tree,
    source: &str,
    path: &str,
    algorithm: HashAlgorithm,
) -> ExtractedFile {
    let bytes = source.as_bytes();
    let mut units: Vec<ExtractedUnit> = Vec::new();
    let mut imports: Vec<String> = Vec::new();
    let mut keys: HashSet<String> = HashSet::new();
    let mut stack = vec![Frame {
        node: tree.root_node(),
        scope: None,
        owner: None,
    }];

    while let Some(Frame { node, scope, owner }) = stack.pop() {
        let kind = node.kind();
        let mut child_scope = scope.clone();
        let mut child_owner = owner;

        if spec.is_function(kind) && node.child_by_field_name("body").is_some() {
            let unit = build_unit(spec, node, source, scope.as_deref(), algorithm, &mut keys);
            if let Some(qualified) = &unit.qualified_name {
                child_scope = Some(Rc::from(qualified.as_str()));
            }
            units.push(unit);
            child_owner = Some(units.len() - 1);
        } else if spec.is_container(kind) {
            if let Some(name) = spec.hooks.container_name(node, bytes) {
                child_scope = Some(Rc::from(qualify(scope.as_deref(), &name).as_str()));
            }
        } else if spec.is_call(kind) {
            if let Some(raw) = spec.hooks.callee(node, bytes) {
                if let Some(module) = spec.hooks.dynamic_import(node, &raw, bytes) {
                    imports.push(module);
                }
                if let (Some(index), Some(callee)) = (owner, clean_callee(&raw)) {
                    units[index].calls.push(callee);
                }
            }
        } else if spec.is_import(kind) {
            imports.extend(spec.hooks.imports(node, bytes));
        }

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(Frame {
                node: child,
                scope: child_scope.clone(),
                owner: child_owner,
            });
        }
    }

    for unit in &mut units {
        dedup_in_order(&mut unit.calls);
    }
    imports.retain(|i| !i.is_empty());
    dedup_in_order(&mut imports);

    ExtractedFile {
        path: path.to_string(),
        language: spec.language,
        units,
        imports,
    }
}

fn build_unit(
    spec: &LanguageSpec,
    node: Node<'_>,
    source: &str,
    scope: Option<&str>,
    algorithm: HashAlgorithm,
    keys: &mut HashSet<String>,
) -> ExtractedUnit {
    let bytes = source.as_bytes();
    let start_line = node.start_position().row as u32 + 1;
    let end_line = node.end_position().row as u32 + 1;
    let text = &source[node.byte_range()];

    let declared = spec
        .hooks
        .function_name(node, bytes)
        .or_else(|| {
            spec.is_anonymous_kind(node.kind())
                .then(|| spec.hooks.binding_name(node, bytes))
                .flatten()
        })
        .map(|n| n.trim().replace("::", "."))
        .filter(|n| !n.is_empty());

    let (name, qualified_name) = match declared {
        Some(declared) => {
            let name = declared.rsplit('.').next().unwrap_or(&declared).to_string();
            let owner = match spec.hooks.receiver(node, bytes) {
                Some(receiver) => Some(qualify(scope, &receiver)),
                None => scope.map(str::to_string),
            };
            (name, Some(qualify(owner.as_deref(), &declared)))
        }
        None => (ANONYMOUS.to_string(), None),
    };

    let base = qualified_name.clone().unwrap_or_else(|| start_line.to_string());
    let key = unique_key(base, start_line, keys);

    ExtractedUnit {
        key,
        name,
        qualified_name,
        start_line,
        end_line,
        byte_size: text.len() as u64,
        source: text.to_string(),
        hash: algorithm.unit_digest(text),
        parameters: spec.hooks.parameters(node, bytes),
        is_async: spec.hooks.is_async(node),
        has_error: node.has_error(),
        calls: Vec::new(),
    }
}

/// Duplicate names in one file (overloads, redefinitions) are disambiguated
/// with the start line.
fn unique_key(base: String, line: u32, keys: &mut HashSet<String>) -> String {
    let mut key = base.clone();
    if keys.contains(&key) {
        key = format!("{base}@{line}");
        let mut n = 2;
        while keys.contains(&key) {
            key = format!("{base}@{line}.{n}");
            n += 1;
        }
    }
    keys.insert(key.clone());
    key
}

fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) if !scope.is_empty() => format!("{scope}.{name}"),
        _ => name.to_string(),
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

/// Reduce raw callee text to a dotted or path-separated name. Returns `None`
/// for callees that are not names, such as `(getHandler())()` or
/// `handlers[kind](event)`.
pub(crate) fn clean_callee(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let compact = strip_type_arguments(&compact).replace("?.", ".");

    // `builder.with(x).finish` is recorded as `finish`.
    let tail = match compact.rfind(')') {
        Some(i) => &compact[i + 1..],
        None => compact.as_str(),
    };
    let tail = tail
        .trim_start_matches(['.', ':', '-', '>'])
        .trim_start_matches(['&', '*']);

    let valid_chars = tail.char_indices().all(|(i, c)| {
        c.is_alphanumeric()
            || matches!(c, '_' | '$' | '.' | ':' | '-' | '>')
            || (c == '!' && i == tail.len() - 1)
    });
    let has_word = tail.chars().any(|c| c.is_alphanumeric() || c == '_' || c == '$');

    if tail.is_empty() || tail.len() > MAX_CALLEE_LEN || !valid_chars || !has_word {
        return None;
    }
    Some(tail.to_string())
}

/// Drop `<...>` type arguments, including a turbofish's leading `::`.
fn strip_type_arguments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '<' => {
                if depth == 0 && out.ends_with("::") {
                    out.truncate(out.len() - 2);
                }
                depth += 1;
            }
            '>' if depth > 0 => depth -= 1,
            // Includes the `>` of a `->` member access.
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}
