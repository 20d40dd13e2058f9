//! Source parsing with a grammar cascade.
//!
//! A file is tried against an ordered list of grammars chosen from its
//! extension. Strict attempts reject any recovered error; if every strict
//! attempt fails, the primary grammar is retried leniently and accepts
//! whatever tree swc could recover. A file that fails all attempts yields a
//! [`ParseFailure`] naming each attempt's error.

use std::collections::HashMap;
use std::sync::Arc;

use swc_common::{
    BytePos, FileName, GLOBALS, Globals, SourceFile, SourceMap,
    comments::{Comment, SingleThreadedComments},
};
use swc_ecma_ast::Program;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

/// Map of byte positions to comments.
pub type CommentMap = HashMap<BytePos, Vec<Comment>>;

/// Comments copied out of `SingleThreadedComments` while it is still alive.
#[derive(Debug, Clone, Default)]
pub struct ExtractedComments {
    pub leading: CommentMap,
    pub trailing: CommentMap,
}

impl ExtractedComments {
    pub fn from_swc(comments: &SingleThreadedComments) -> Self {
        let (leading, trailing) = comments.borrow_all();
        Self {
            leading: leading.iter().map(|(k, v)| (*k, v.clone())).collect(),
            trailing: trailing.iter().map(|(k, v)| (*k, v.clone())).collect(),
        }
    }

    pub fn borrow_all(&self) -> (&CommentMap, &CommentMap) {
        (&self.leading, &self.trailing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// TypeScript with JSX.
    Tsx,
    /// TypeScript without JSX, so `<T>expr` casts parse.
    Typescript,
    /// ECMAScript with JSX and decorators.
    EcmascriptJsx,
}

impl Grammar {
    fn syntax(self) -> Syntax {
        match self {
            Grammar::Tsx => Syntax::Typescript(TsSyntax {
                tsx: true,
                decorators: true,
                ..Default::default()
            }),
            Grammar::Typescript => Syntax::Typescript(TsSyntax {
                tsx: false,
                decorators: true,
                ..Default::default()
            }),
            Grammar::EcmascriptJsx => Syntax::Es(EsSyntax {
                jsx: true,
                decorators: true,
                ..Default::default()
            }),
        }
    }
}

impl std::fmt::Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grammar::Tsx => write!(f, "tsx"),
            Grammar::Typescript => write!(f, "typescript"),
            Grammar::EcmascriptJsx => write!(f, "jsx"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseAttempt {
    pub grammar: Grammar,
    pub strict: bool,
}

impl ParseAttempt {
    const fn strict(grammar: Grammar) -> Self {
        Self {
            grammar,
            strict: true,
        }
    }

    const fn lenient(grammar: Grammar) -> Self {
        Self {
            grammar,
            strict: false,
        }
    }
}

/// Ordered attempts for a file, keyed on its extension.
pub fn attempts_for(file_path: &str) -> Vec<ParseAttempt> {
    let ext = file_path.rsplit('.').next().unwrap_or_default();
    let grammars: &[Grammar] = match ext {
        "ts" | "mts" | "cts" => &[Grammar::Typescript, Grammar::Tsx],
        "tsx" => &[Grammar::Tsx, Grammar::Typescript],
        _ => &[Grammar::EcmascriptJsx, Grammar::Tsx],
    };
    let mut attempts: Vec<ParseAttempt> = grammars.iter().copied().map(ParseAttempt::strict).collect();
    attempts.push(ParseAttempt::lenient(grammars[0]));
    attempts
}

#[derive(Debug, thiserror::Error)]
#[error("failed to parse {file}: {}", .attempts.join("; "))]
pub struct ParseFailure {
    pub file: String,
    /// One `grammar: error` entry per attempt.
    pub attempts: Vec<String>,
}

pub struct ParsedSource {
    pub program: Program,
    pub source_file: Arc<SourceFile>,
    pub comments: ExtractedComments,
    pub grammar: Grammar,
    /// Errors swc recovered from; only a lenient attempt leaves any.
    pub recovered_errors: usize,
}

impl ParsedSource {
    pub fn base(&self) -> BytePos {
        self.source_file.start_pos
    }

    /// Byte offset of `pos` within the parsed text.
    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.source_file.start_pos.0) as usize
    }
}

/// Parse `code` through the cascade for `file_path`.
pub fn parse_source(code: &str, file_path: &str) -> Result<ParsedSource, ParseFailure> {
    let mut errors = Vec::new();
    for attempt in attempts_for(file_path) {
        match try_parse(code, file_path, attempt) {
            Ok(parsed) => {
                if !errors.is_empty() {
                    tracing::debug!(file = file_path, grammar = %attempt.grammar, "parsed after fallback");
                }
                return Ok(parsed);
            }
            Err(err) => {
                let mode = if attempt.strict { "" } else { " (lenient)" };
                errors.push(format!("{}{}: {}", attempt.grammar, mode, err));
            }
        }
    }
    Err(ParseFailure {
        file: file_path.to_string(),
        attempts: errors,
    })
}

fn try_parse(code: &str, file_path: &str, attempt: ParseAttempt) -> Result<ParsedSource, String> {
    GLOBALS.set(&Globals::new(), || {
        let source_map: Arc<SourceMap> = Default::default();
        let source_file =
            source_map.new_source_file(FileName::Real(file_path.into()).into(), code.to_string());

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(
            attempt.grammar.syntax(),
            StringInput::from(&*source_file),
            Some(&comments),
        );

        let program = parser
            .parse_program()
            .map_err(|e| format!("{:?}", e.kind()))?;
        let recovered = parser.take_errors();
        if attempt.strict && !recovered.is_empty() {
            let first = recovered
                .first()
                .map(|e| format!("{:?}", e.kind()))
                .unwrap_or_default();
            return Err(format!("{} recoverable error(s), first: {}", recovered.len(), first));
        }

        Ok(ParsedSource {
            program,
            source_file,
            comments: ExtractedComments::from_swc(&comments),
            grammar: attempt.grammar,
            recovered_errors: recovered.len(),
        })
    })
}
