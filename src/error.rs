//! Error types
//!
//! Template errors surface while templates are declared, parsed or
//! compiled. Candidate errors surface when a compiled set is applied to
//! malformed candidate input, before any feature is produced.

use thiserror::Error;

use crate::parser::Rule;

/// Error in a template declaration
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template error: no attribute names given")]
    EmptyAttributes,

    #[error("Template error: improper ngram range: {min}..={max}")]
    InvalidNgramRange { min: i64, max: i64 },

    #[error("Template error: invalid regular expression {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Template error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("Template error: unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Template error: {name} expects {expected} arguments, found {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("Template error: argument {position} of {name} must be {expected}")]
    ArgumentType {
        name: String,
        position: usize,
        expected: &'static str,
    },
}

/// Error in the candidate input handed to `apply`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("Candidate error: candidate {slot} has no positions")]
    EmptyCandidate { slot: usize },

    #[error("Candidate error: templates reference candidate {slot}, but only {provided} given")]
    MissingCandidate { slot: usize, provided: usize },

    #[error("Candidate error: candidates {first} and {second} overlap")]
    OverlappingCandidates { first: usize, second: usize },
}
