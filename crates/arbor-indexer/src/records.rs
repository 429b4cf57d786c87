//! Turns extracted units into graph records

use arbor_core::GraphRecord;

use crate::effects::EffectClassifier;
use crate::extractor::{ExtractedFile, ExtractedUnit};
use crate::languages::collapse_whitespace;

const CONSTRUCTOR_NAMES: &[&str] = &["new", "__init__", "constructor", "__new__"];
const ENTRY_NAMES: &[&str] = &["main", "init", "start"];

/// Largest body, in lines, still considered a thin wrapper.
const DELEGATE_MAX_LINES: u32 = 3;

/// Builds graph records for a parsed file.
pub struct RecordBuilder<'a> {
    classifier: &'a EffectClassifier,
    max_calls: usize,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(classifier: &'a EffectClassifier, max_calls: usize) -> Self {
        Self {
            classifier,
            max_calls,
        }
    }

    pub fn build(&self, file: &ExtractedFile, unit: &ExtractedUnit) -> GraphRecord {
        let calls: Vec<String> = unit.calls.iter().take(self.max_calls).cloned().collect();
        let effects = self.classifier.classify(&unit.calls, &file.imports);

        GraphRecord {
            id: unit.identifier(&file.path),
            name: unit.name.clone(),
            file: file.path.clone(),
            line: unit.start_line,
            signature: signature(unit),
            is_async: unit.is_async,
            calls,
            effects,
            tags: tags(&file.path, unit),
            patterns: patterns(unit),
            lang: file.language,
        }
    }

    /// Records for every unit of `file`, in source order.
    pub fn build_all(&self, file: &ExtractedFile) -> Vec<GraphRecord> {
        file.units.iter().map(|unit| self.build(file, unit)).collect()
    }
}

fn signature(unit: &ExtractedUnit) -> String {
    let prefix = if unit.is_async { "async " } else { "" };
    collapse_whitespace(&format!("{prefix}{}{}", unit.name, unit.parameters))
}

fn tags(path: &str, unit: &ExtractedUnit) -> Vec<String> {
    let mut tags = Vec::new();
    if is_test_name(&unit.name) || is_test_path(path) {
        tags.push("test");
    }
    let owner = unit
        .qualified_name
        .as_deref()
        .and_then(|q| q.rsplit_once('.'))
        .map(|(owner, _)| owner.rsplit('.').next().unwrap_or(owner));
    if CONSTRUCTOR_NAMES.contains(&unit.name.as_str()) || owner == Some(unit.name.as_str()) {
        tags.push("constructor");
    }
    if ENTRY_NAMES.contains(&unit.name.as_str()) {
        tags.push("entry");
    }
    if unit.is_async {
        tags.push("async");
    }
    if unit.is_anonymous() {
        tags.push("anonymous");
    }
    tags.into_iter().map(str::to_string).collect()
}

/// `test`, `test_parse`, `testParse`, but not `testimony`.
fn is_test_name(name: &str) -> bool {
    match name.strip_prefix("test").or_else(|| name.strip_prefix("Test")) {
        Some(rest) => rest.is_empty() || rest.starts_with('_') || rest.starts_with(char::is_uppercase),
        None => false,
    }
}

fn is_test_path(path: &str) -> bool {
    path.split('/').any(|segment| matches!(segment, "test" | "tests" | "__tests__" | "spec"))
        || path.contains("_test.")
        || path.contains(".test.")
        || path.contains(".spec.")
        || path.rsplit('/').next().is_some_and(|f| f.starts_with("test_"))
}

fn patterns(unit: &ExtractedUnit) -> Vec<String> {
    let mut patterns = Vec::new();
    let recursive = !unit.is_anonymous()
        && unit.calls.iter().any(|call| {
            call.rsplit(['.', ':']).next() == Some(unit.name.as_str())
        });
    if recursive {
        patterns.push("recursive".to_string());
    }
    if unit.calls.len() == 1 && unit.end_line - unit.start_line + 1 <= DELEGATE_MAX_LINES {
        patterns.push("delegate".to_string());
    }
    patterns
}
