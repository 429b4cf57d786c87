//! Graph store: one JSON record per live analysis unit, one record per line

use std::collections::HashMap;
use std::path::Path;

use crate::cache::write_atomic;
use crate::error::{Error, Result};
use crate::model::GraphRecord;

/// In-memory view of the graph store. Record order is insertion order and
/// survives every update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStore {
    records: Vec<GraphRecord>,
    /// file -> id -> position in `records`
    index: HashMap<String, HashMap<String, usize>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in order. When a `(file, id)` key repeats, the
    /// last occurrence wins and takes the later position.
    pub fn from_records(records: Vec<GraphRecord>) -> Self {
        let mut last: HashMap<(&str, &str), usize> = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            last.insert((record.file.as_str(), record.id.as_str()), position);
        }
        let keep: Vec<bool> = records
            .iter()
            .enumerate()
            .map(|(position, r)| last[&(r.file.as_str(), r.id.as_str())] == position)
            .collect();
        drop(last);

        let mut store = Self {
            records: records
                .into_iter()
                .zip(keep)
                .filter_map(|(record, keep)| keep.then_some(record))
                .collect(),
            index: HashMap::new(),
        };
        store.reindex();
        store
    }

    /// Load from disk. A missing file is `None`; a line that fails to parse
    /// makes the whole artifact unusable.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };
        Self::parse(&raw).map(Some)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut records = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: GraphRecord = serde_json::from_str(line)
                .map_err(|source| Error::MalformedGraph {
                    line: index + 1,
                    source,
                })?;
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    pub fn to_jsonl(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Rewrite the whole store.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.to_jsonl()?.as_bytes())
    }

    pub fn records(&self) -> &[GraphRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, file: &str, id: &str) -> Option<&GraphRecord> {
        let position = *self.index.get(file)?.get(id)?;
        self.records.get(position)
    }

    pub fn records_for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a GraphRecord> + 'a {
        self.records.iter().filter(move |r| r.file == file)
    }

    /// Append a record, dropping any existing record with the same key so
    /// a `(file, id)` pair is never stored twice.
    pub fn insert(&mut self, record: GraphRecord) {
        if let Some(position) = self.position(&record.file, &record.id) {
            self.records.remove(position);
            self.reindex();
        }
        self.index
            .entry(record.file.clone())
            .or_default()
            .insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    /// Keep only the records for which `keep` returns true, in one pass.
    /// Returns how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&GraphRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|r| keep(r));
        let removed = before - self.records.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn position(&self, file: &str, id: &str) -> Option<usize> {
        self.index.get(file)?.get(id).copied()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (position, record) in self.records.iter().enumerate() {
            self.index
                .entry(record.file.clone())
                .or_default()
                .insert(record.id.clone(), position);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;

    fn record(file: &str, name: &str, calls: &[&str]) -> GraphRecord {
        GraphRecord {
            id: format!("{file}#{name}"),
            name: name.to_string(),
            file: file.to_string(),
            line: 1,
            signature: format!("{name}()"),
            is_async: false,
            calls: calls.iter().map(|c| c.to_string()).collect(),
            effects: Vec::new(),
            tags: Vec::new(),
            patterns: Vec::new(),
            lang: Language::Python,
        }
    }

    #[test]
    fn test_line_format() {
        let mut r = record("app.py", "load", &["open", "json.loads"]);
        r.effects = vec!["filesystem".to_string()];
        let store = GraphStore::from_records(vec![r]);

        insta::assert_snapshot!(
            store.to_jsonl().unwrap().trim_end(),
            @r##"{"id":"app.py#load","name":"load","file":"app.py","line":1,"signature":"load()","async":false,"calls":["open","json.loads"],"effects":["filesystem"],"lang":"python"}"##
        );
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut store = GraphStore::new();
        store.insert(record("a.py", "f", &[]));
        store.insert(record("b.py", "f", &[]));
        store.insert(record("a.py", "f", &["g"]));

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].file, "b.py");
        assert_eq!(store.get("a.py", "a.py#f").unwrap().calls, vec!["g"]);
    }

    #[test]
    fn test_retain_reindexes() {
        let mut store = GraphStore::from_records(vec![
            record("a.py", "f", &[]),
            record("a.py", "g", &[]),
            record("b.py", "f", &[]),
        ]);

        assert_eq!(store.retain(|r| r.id != "a.py#f"), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("a.py", "a.py#f").is_none());
        assert_eq!(store.get("b.py", "b.py#f").unwrap().file, "b.py");

        assert_eq!(store.retain(|r| r.file != "a.py"), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("b.py", "b.py#f").unwrap().id, "b.py#f");
    }

    #[test]
    fn test_from_records_keeps_last_duplicate() {
        let store = GraphStore::from_records(vec![
            record("a.py", "f", &[]),
            record("b.py", "g", &[]),
            record("a.py", "f", &["g"]),
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0].id, "b.py#g");
        assert_eq!(store.get("a.py", "a.py#f").unwrap().calls, vec!["g"]);
    }

    #[test]
    fn test_large_store_builds_and_looks_up() {
        let records: Vec<GraphRecord> = (0..50_000)
            .map(|i| record(&format!("src/m{}.py", i / 100), &format!("f{i}"), &[]))
            .collect();
        let mut store = GraphStore::from_records(records);
        assert_eq!(store.len(), 50_000);

        for i in (0..50_000).step_by(7) {
            let file = format!("src/m{}.py", i / 100);
            assert!(store.get(&file, &format!("{file}#f{i}")).is_some());
        }

        let removed = store.retain(|r| !r.file.ends_with("0.py"));
        assert_eq!(removed, 5_000);
        for i in 0..1_000 {
            store.insert(record("new.py", &format!("n{i}"), &[]));
        }
        assert_eq!(store.len(), 46_000);
        assert_eq!(store.records().last().unwrap().id, "new.py#n999");
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let good = serde_json::to_string(&record("a.py", "f", &[])).unwrap();
        let raw = format!("{good}\n\n{{\"id\":\n");

        match GraphStore::parse(&raw) {
            Err(Error::MalformedGraph { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed graph error, got {other:?}"),
        }
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("graph.jsonl");
        let store = GraphStore::from_records(vec![
            record("z.py", "last", &[]),
            record("a.py", "first", &["last"]),
        ]);

        store.save(&path).unwrap();
        let loaded = GraphStore::load(&path).unwrap().unwrap();

        assert_eq!(loaded, store);
        assert_eq!(loaded.records()[0].name, "last");
        assert!(GraphStore::load(&temp.path().join("missing.jsonl")).unwrap().is_none());
    }
}
