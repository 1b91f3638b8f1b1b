//! Turning raw log text into templates: line classification and
//! canonicalization of volatile substrings.

pub mod canonical;
pub mod line;

pub use canonical::Canonicalizer;
pub use line::{LineClassifier, ParsedLine};
