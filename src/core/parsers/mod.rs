//! Source parsing.
//!
//! - `source`: JS/TS/JSX parsing through swc with a per-extension grammar cascade

pub mod source;

pub use source::{ExtractedComments, Grammar, ParseAttempt, ParseFailure, ParsedSource, parse_source};
