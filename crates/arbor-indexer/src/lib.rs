//! Parsing, effect classification, and tree walking

pub mod effects;
pub mod error;
pub mod extractor;
pub mod languages;
pub mod records;
pub mod registry;
pub mod walker;

#[cfg(test)]
pub mod tests;

pub use effects::EffectClassifier;
pub use error::{ParseError, WalkError};
pub use extractor::{ExtractedFile, ExtractedUnit};
pub use languages::{LanguageHooks, LanguageSpec};
pub use records::RecordBuilder;
pub use registry::ParserRegistry;
pub use walker::{DEFAULT_IGNORES, TreeWalker, WalkedFile};
