//! Per-file facts gathered before candidate analysis.
//!
//! - `comments`: byte-range index of every comment in the file
//! - `directive`: `i18n-ignore*` directive parsing
//! - `statements`: statement line spans for statement-level suppression
//! - `suppressions`: line and range suppressions built from directives

pub mod comments;
pub mod directive;
pub mod statements;
pub mod suppressions;

pub use comments::{CommentIndex, SourceComment};
pub use directive::Directive;
pub use statements::StatementCollector;
pub use suppressions::{DisabledRange, Suppressions};
