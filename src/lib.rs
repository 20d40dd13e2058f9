//! Hanzi - CJK text extraction and replacement for JS/TS projects
//!
//! Hanzi finds target-script text in JavaScript, TypeScript and JSX sources,
//! records it in a translation ledger, rewrites the sources to call a
//! lookup function, keeps the ledger in step with later source edits, and
//! generates per-locale packs without silently overwriting translations.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (arguments, commands, output)
//! - `config`: Configuration file loading and parsing
//! - `core`: Extraction, rewriting, reconciliation and merging
//! - `issues`: Issue type definitions and reporting
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
pub mod utils;
