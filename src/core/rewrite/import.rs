//! Lookup-function import: detection and insertion point.

use swc_ecma_ast::{Expr, ImportSpecifier, Lit, ModuleDecl, ModuleItem, Program, Stmt};

use crate::core::data::source::LineIndex;
use crate::core::parsers::ParsedSource;
use crate::utils::quote_single;

/// `import { t } from 'core/util/i18n';`
pub fn import_line(lookup_fn: &str, import_path: &str) -> String {
    format!("import {{ {lookup_fn} }} from {};", quote_single(import_path))
}

/// Whether any import already binds `lookup_fn` locally.
pub fn binds_lookup(parsed: &ParsedSource, lookup_fn: &str) -> bool {
    let Program::Module(module) = &parsed.program else {
        return false;
    };
    module.body.iter().any(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
            import.specifiers.iter().any(|spec| {
                let local = match spec {
                    ImportSpecifier::Named(named) => &named.local,
                    ImportSpecifier::Default(default) => &default.local,
                    ImportSpecifier::Namespace(ns) => &ns.local,
                };
                local.sym == lookup_fn
            })
        }
        _ => false,
    })
}

/// Byte offset where a new import line goes: after a shebang and any
/// directive prologue (`'use client';`), otherwise at the top.
pub fn insertion_offset(parsed: &ParsedSource, source: &str, lines: &LineIndex) -> usize {
    let mut offset = if source.starts_with("#!") {
        source.find('\n').map_or(source.len(), |p| p + 1)
    } else {
        0
    };

    let stmts: Vec<&Stmt> = match &parsed.program {
        Program::Module(module) => module
            .body
            .iter()
            .map_while(|item| match item {
                ModuleItem::Stmt(stmt) => Some(stmt),
                ModuleItem::ModuleDecl(_) => None,
            })
            .collect(),
        Program::Script(script) => script.body.iter().collect(),
    };

    let mut prologue_end = None;
    for stmt in stmts {
        match stmt {
            Stmt::Expr(expr_stmt) if matches!(&*expr_stmt.expr, Expr::Lit(Lit::Str(_))) => {
                prologue_end = Some(parsed.offset(expr_stmt.span.hi));
            }
            _ => break,
        }
    }

    if let Some(end) = prologue_end {
        let line = lines.line_of(end.saturating_sub(1));
        offset = lines.line_start(line + 1).unwrap_or(source.len());
    }
    offset
}

#[cfg(test)]
mod tests {
    use crate::core::parsers::parse_source;
    use crate::core::rewrite::import::*;

    fn offset(code: &str) -> usize {
        let parsed = parse_source(code, "a.js").unwrap();
        insertion_offset(&parsed, code, &LineIndex::new(code))
    }

    #[test]
    fn test_import_line() {
        assert_eq!(
            import_line("t", "core/util/i18n"),
            "import { t } from 'core/util/i18n';"
        );
    }

    #[test]
    fn test_binds_lookup() {
        let parsed = parse_source("import { t } from 'x';\nconst a = 1;", "a.js").unwrap();
        assert!(binds_lookup(&parsed, "t"));
        let parsed = parse_source("import { tr as t } from 'x';", "a.js").unwrap();
        assert!(binds_lookup(&parsed, "t"));
        let parsed = parse_source("import { t as tr } from 'x';", "a.js").unwrap();
        assert!(!binds_lookup(&parsed, "t"));
        let parsed = parse_source("const t = 1;", "a.js").unwrap();
        assert!(!binds_lookup(&parsed, "t"));
    }

    #[test]
    fn test_insertion_offset() {
        assert_eq!(offset("const a = 1;"), 0);
        let code = "'use client';\nconst a = 1;";
        assert_eq!(offset(code), "'use client';\n".len());
        let code = "#!/usr/bin/env node\nconst a = 1;";
        assert_eq!(offset(code), "#!/usr/bin/env node\n".len());
    }
}
