//! Core data types shared by extraction, rewriting and reconciliation.
//!
//! - `record`: TranslationRecord, one extracted occurrence of text
//! - `source`: LineIndex and SourceLocation

pub mod record;
pub mod source;

pub use record::{TranslationRecord, has_placeholders};
pub use source::{LineIndex, SourceLocation};
