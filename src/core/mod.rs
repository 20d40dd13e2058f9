//! The extraction, rewriting and ledger engine.
//!
//! ## Module Structure
//!
//! - `hash`, `script`: key derivation and the target character set
//! - `parsers`: swc parsing with a grammar cascade
//! - `collect`: comments, directives and suppressions per file
//! - `rules`: exclusion rules shared by extraction and rewriting
//! - `extract`: source to translation records
//! - `rewrite`: translation records back into source as lookup calls
//! - `format_gaps`: blank lines between class members across a formatter run
//! - `reconcile`: stored ledger against a fresh extraction
//! - `ledger`: ledger model and store
//! - `merge`: locale packs with conflict blocking
//! - `files`, `hooks`, `context`: discovery, extension points, per-run setup

pub mod collect;
pub mod context;
pub mod data;
pub mod extract;
pub mod files;
pub mod format_gaps;
pub mod hash;
pub mod hooks;
pub mod ledger;
pub mod merge;
pub mod parsers;
pub mod reconcile;
pub mod rewrite;
pub mod rules;
pub mod script;

pub use data::{LineIndex, SourceLocation, TranslationRecord};
