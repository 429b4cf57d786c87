//! Parser registry for tree-sitter parsers
//!
//! Tree-sitter parsers are not `Sync`, so each worker owns its own registry
//! and reuses one parser per language across the files it handles.

use std::collections::HashMap;

use arbor_core::{HashAlgorithm, Language};
use tracing::debug;
use tree_sitter::{Parser, Tree};

use crate::error::ParseError;
use crate::extractor::{self, ExtractedFile};
use crate::languages::{LanguageSpec, grammar};

pub struct ParserRegistry {
    parsers: HashMap<Language, Parser>,
    algorithm: HashAlgorithm,
}

impl ParserRegistry {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            parsers: HashMap::new(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn parser(&mut self, language: Language) -> Result<&mut Parser, ParseError> {
        if !self.parsers.contains_key(&language) {
            let mut parser = Parser::new();
            parser
                .set_language(&grammar(language))
                .map_err(|e| ParseError::Grammar {
                    language: language.as_str(),
                    reason: e.to_string(),
                })?;
            debug!("Loaded {} grammar", language.as_str());
            self.parsers.insert(language, parser);
        }
        self.parsers
            .get_mut(&language)
            .ok_or_else(|| ParseError::Unsupported(language.as_str().to_string()))
    }

    pub fn parse(&mut self, language: Language, source: &str) -> Result<Tree, ParseError> {
        self.parser(language)?
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree(language.as_str().to_string()))
    }

    /// Parse `content` and extract its units. `path` is the file's key and
    /// prefixes every unit identifier.
    pub fn extract(
        &mut self,
        path: &str,
        language: Language,
        content: &[u8],
    ) -> Result<ExtractedFile, ParseError> {
        let source =
            std::str::from_utf8(content).map_err(|_| ParseError::InvalidUtf8(path.to_string()))?;
        let tree = self.parse(language, source)?;
        if tree.root_node().has_error() {
            debug!("{} has syntax errors, extracting what parsed", path);
        }

        let spec = LanguageSpec::for_language(language);
        Ok(extractor::extract(&spec, &tree, source, path, self.algorithm))
    }
}
