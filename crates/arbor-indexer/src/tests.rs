//! Unit tests for arbor-indexer module

use crate::*;
use arbor_core::{HashAlgorithm, Language, ScanConfig};
use std::fs;

fn extract(path: &str, language: Language, source: &str) -> ExtractedFile {
    let mut registry = ParserRegistry::new(HashAlgorithm::Sha256);
    registry
        .extract(path, language, source.as_bytes())
        .expect("extraction should succeed")
}

fn keys(file: &ExtractedFile) -> Vec<&str> {
    file.units.iter().map(|u| u.key.as_str()).collect()
}

#[test]
fn test_python_extraction() {
    let source = r#"import os
from json import loads

class User:
    def __init__(self, name):
        self.name = name

    def save(self):
        data = loads("{}")
        os.remove(self.path)
        return self.save()

async def fetch_user(id):
    return await client.get(id)

def helper():
    pass
"#;
    let file = extract("app/user.py", Language::Python, source);

    assert_eq!(keys(&file), vec!["User.__init__", "User.save", "fetch_user", "helper"]);
    assert_eq!(file.imports, vec!["os", "json"]);

    let save = file.unit("User.save").unwrap();
    assert_eq!(save.name, "save");
    assert_eq!(save.start_line, 8);
    assert_eq!(save.end_line, 11);
    assert_eq!(save.calls, vec!["loads", "os.remove", "self.save"]);
    assert_eq!(save.identifier(&file.path), "app/user.py#User.save");

    let fetch = file.unit("fetch_user").unwrap();
    assert!(fetch.is_async);
    assert_eq!(fetch.calls, vec!["client.get"]);
}

#[test]
fn test_javascript_extraction() {
    let source = r#"const fs = require('fs');
import axios from 'axios';

function loadConfig(path) {
  return JSON.parse(fs.readFileSync(path, 'utf8'));
}

const handler = async (req) => {
  const cfg = loadConfig(req.path);
  return axios.get(cfg.url);
};

class Service {
  constructor(repo) { this.repo = repo; }
  run() { [1, 2].map((x) => x * 2); }
}
"#;
    let file = extract("src/app.js", Language::JavaScript, source);

    assert_eq!(
        keys(&file),
        vec!["loadConfig", "handler", "Service.constructor", "Service.run", "15"]
    );
    assert_eq!(file.imports, vec!["fs", "axios"]);

    let load = file.unit("loadConfig").unwrap();
    assert_eq!(load.calls, vec!["JSON.parse", "fs.readFileSync"]);

    let handler = file.unit("handler").unwrap();
    assert!(handler.is_async);
    assert_eq!(handler.parameters, "(req)");
    assert_eq!(handler.calls, vec!["loadConfig", "axios.get"]);

    let callback = file.unit("15").unwrap();
    assert!(callback.is_anonymous());
    assert_eq!(callback.name, extractor::ANONYMOUS);
}

#[test]
fn test_only_anonymous_kinds_take_binding_names() {
    let source = r#"const run = () => start();
const api = {
  save: function () { return db.save(); },
};
module.exports.load = () => read();
items.forEach((item) => log(item));
"#;
    let file = extract("src/bind.js", Language::JavaScript, source);

    assert_eq!(keys(&file), vec!["run", "save", "load", "6"]);
    assert!(file.unit("6").unwrap().is_anonymous());

    let js = LanguageSpec::for_language(Language::JavaScript);
    assert!(js.is_anonymous_kind("arrow_function"));
    assert!(!js.is_anonymous_kind("function_declaration"));
    assert!(!LanguageSpec::for_language(Language::Python).is_anonymous_kind("function_definition"));
}

#[test]
fn test_syntax_error_is_confined_to_its_unit() {
    let source = "function good() {\n  return 1;\n}\n\nfunction bad() {\n  return 2 +;\n}\n";
    let file = extract("src/broken.js", Language::JavaScript, source);

    assert!(!file.unit("good").unwrap().has_error);
    assert!(file.unit("bad").unwrap().has_error);
}

#[test]
fn test_rust_extraction() {
    let source = r#"use std::fs;

pub struct Store;

impl Store {
    pub fn new() -> Self {
        Store
    }

    pub async fn load(&self, path: &str) -> String {
        let raw = fs::read_to_string(path).unwrap_or_default();
        println!("{}", raw);
        raw
    }
}

fn main() {
    let store = Store::new();
}
"#;
    let file = extract("src/main.rs", Language::Rust, source);

    assert_eq!(keys(&file), vec!["Store.new", "Store.load", "main"]);
    assert_eq!(file.imports, vec!["std::fs"]);

    let load = file.unit("Store.load").unwrap();
    assert!(load.is_async);
    assert_eq!(load.calls, vec!["unwrap_or_default", "fs::read_to_string", "println!"]);
    assert_eq!(file.unit("main").unwrap().calls, vec!["Store::new"]);
}

#[test]
fn test_go_receiver_and_literal() {
    let source = "package main

import (
\t\"fmt\"
\t\"os\"
)

type Server struct{}

func (s *Server) Start() {
\tfmt.Println(\"start\")
}

func main() {
\ts := &Server{}
\ts.Start()
\tgo func() { os.Exit(0) }()
}
";
    let file = extract("main.go", Language::Go, source);

    assert_eq!(keys(&file), vec!["Server.Start", "main", "17"]);
    assert_eq!(file.imports, vec!["fmt", "os"]);
    assert_eq!(file.unit("Server.Start").unwrap().name, "Start");
    assert_eq!(file.unit("main").unwrap().calls, vec!["s.Start"]);
    assert_eq!(file.unit("17").unwrap().calls, vec!["os.Exit"]);
}

#[test]
fn test_java_and_c_extraction() {
    let java = r#"import java.sql.Connection;

public class Repo {
    public Repo() {}
    public void save(Connection conn) {
        conn.prepareStatement("x").execute();
        System.out.println("saved");
    }
}
"#;
    let file = extract("Repo.java", Language::Java, java);
    assert_eq!(keys(&file), vec!["Repo.Repo", "Repo.save"]);
    assert_eq!(file.imports, vec!["java.sql.Connection"]);
    assert_eq!(
        file.unit("Repo.save").unwrap().calls,
        vec!["execute", "conn.prepareStatement", "System.out.println"]
    );

    let c = r#"#include <stdio.h>
#include "util.h"

static int *make(int n) {
    return malloc(n);
}

int main(int argc, char **argv) {
    printf("%d\n", argc);
    return 0;
}
"#;
    let file = extract("main.c", Language::C, c);
    assert_eq!(keys(&file), vec!["make", "main"]);
    assert_eq!(file.imports, vec!["stdio.h", "util.h"]);
    assert_eq!(file.unit("make").unwrap().parameters, "(int n)");
    assert_eq!(file.unit("main").unwrap().calls, vec!["printf"]);
}

#[test]
fn test_duplicate_names_get_line_suffix() {
    let source = "def parse(a):\n    return a\n\ndef parse(b):\n    return b\n";
    let file = extract("dup.py", Language::Python, source);
    assert_eq!(keys(&file), vec!["parse", "parse@4"]);
}

#[test]
fn test_unit_hash_ignores_formatting() {
    let compact = extract("a.py", Language::Python, "def f(a,b):\n    return a+b\n");
    let spaced = extract("a.py", Language::Python, "def f(a, b):\n    return a + b\n");
    let changed = extract("a.py", Language::Python, "def f(a, b):\n    return a - b\n");

    assert_eq!(compact.units[0].hash, spaced.units[0].hash);
    assert_ne!(spaced.units[0].hash, changed.units[0].hash);
}

#[test]
fn test_invalid_utf8_is_a_parse_error() {
    let mut registry = ParserRegistry::new(HashAlgorithm::Sha256);
    let result = registry.extract("bad.py", Language::Python, &[0x64, 0x65, 0x66, 0xff, 0xfe]);
    assert!(matches!(result, Err(ParseError::InvalidUtf8(path)) if path == "bad.py"));
}

#[test]
fn test_records_carry_effects_tags_and_patterns() {
    let source = r#"use std::fs;

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    pub async fn load(&self, path: &str) -> String {
        let raw = fs::read_to_string(path).unwrap_or_default();
        println!("{}", raw);
        raw
    }

    fn walk(&self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.walk(n - 1)
    }
}
"#;
    let file = extract("src/store.rs", Language::Rust, source);
    let classifier = EffectClassifier::new();
    let builder = RecordBuilder::new(&classifier, 50);
    let records = builder.build_all(&file);

    assert_eq!(records.len(), 3);

    let new = &records[0];
    assert_eq!(new.id, "src/store.rs#Store.new");
    assert_eq!(new.signature, "new()");
    assert_eq!(new.tags, vec!["constructor"]);
    assert_eq!(new.patterns, vec!["delegate"]);

    let load = &records[1];
    assert_eq!(load.signature, "async load(&self, path: &str)");
    assert!(load.is_async);
    assert_eq!(load.effects, vec!["filesystem", "logging"]);
    assert_eq!(load.tags, vec!["async"]);
    assert_eq!(load.lang, Language::Rust);

    let walk = &records[2];
    assert_eq!(walk.patterns, vec!["recursive"]);
    assert!(walk.effects.is_empty());
}

#[test]
fn test_record_calls_are_capped() {
    let body: String = (0..10).map(|i| format!("    step{i}()\n")).collect();
    let source = format!("def pipeline():\n{body}");
    let file = extract("p.py", Language::Python, &source);
    let classifier = EffectClassifier::new();

    let record = RecordBuilder::new(&classifier, 4).build(&file, &file.units[0]);
    assert_eq!(record.calls, vec!["step0", "step1", "step2", "step3"]);
}

#[test]
fn test_walker_applies_ignores() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    for dir in ["src", "node_modules/pkg", "generated", "legacy", "scratch"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    fs::write(root.join("src/app.py"), "def a():\n    pass\n").unwrap();
    fs::write(root.join("src/util.ts"), "export function u() {}\n").unwrap();
    fs::write(root.join("src/notes.txt"), "not code\n").unwrap();
    fs::write(root.join("node_modules/pkg/index.js"), "function x() {}\n").unwrap();
    fs::write(root.join("generated/gen.py"), "def g():\n    pass\n").unwrap();
    fs::write(root.join("legacy/old.py"), "def o():\n    pass\n").unwrap();
    fs::write(root.join("scratch/tmp.py"), "def t():\n    pass\n").unwrap();
    fs::write(root.join("big.py"), "x = 1\n".repeat(100)).unwrap();
    fs::write(root.join(".gitignore"), "generated/\n").unwrap();
    fs::write(root.join(".arborignore"), "legacy/\n").unwrap();

    let config = ScanConfig {
        extra_ignores: vec!["scratch/".to_string()],
        max_file_size: 200,
        ..ScanConfig::default()
    };
    let walker = TreeWalker::new(root, &config).unwrap();
    let files = walker.walk();

    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["src/app.py", "src/util.ts"]);
    assert_eq!(files[1].language, Language::TypeScript);
    assert!(files[0].last_modified.is_some());
}

#[test]
fn test_walker_rejects_missing_root() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("nope");
    assert!(matches!(
        TreeWalker::new(&missing, &ScanConfig::default()),
        Err(WalkError::RootMissing(_))
    ));
}
