//! Treefeats: declarative feature templates over dependency trees
//!
//! Templates describe where to look in a sentence's parse (structural
//! selectors) and what to read there (node attributes). A compiled template
//! set is applied to many (tree, candidate) pairs, producing feature strings
//! for a downstream classifier.

pub mod compile; // Flattened template sets and apply entry points
pub mod config; // Apply-time options
pub mod error;
pub mod eval; // Selector evaluation against a tree
pub mod generator; // Feature generation rules (ngrams, regexp, ...)
pub mod indicator; // Indicators, combinations and feature formatting
pub mod parser; // Template declaration language parser
pub mod presets; // Stock mention and relation template sets
pub mod query; // Tree query interface
pub mod selector; // Structural selector algebra
pub mod tree; // Reference tree built from parser columns

#[cfg(test)]
mod test_utils;

// Re-exports for convenience
pub use compile::{Compile, Entry, Template};
pub use config::FeatureConfig;
pub use error::{CandidateError, TemplateError};
pub use eval::Position;
pub use generator::{Generator, NgramRange};
pub use indicator::{Combinations, Features, Indicator};
pub use parser::parse_templates;
pub use query::TreeQuery;
pub use selector::{Expr, MatchMode, NodeSet};
pub use tree::{Attributes, Node, NodeId, Sentence, Tree};
