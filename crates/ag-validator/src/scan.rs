// scan.rs - Syntax-tree walk for forbidden calls and imports.
//
// Findings come out in source order. Function bodies, decorators, type
// parameter bounds, type aliases, default values, lambda bodies,
// comprehensions and f-string fields are all walked, so no scope hides a
// call from the scan.

use std::collections::BTreeSet;

use rustpython_parser::ast::{Expr, Stmt};

use crate::syntax::{CallTarget, LineIndex, Module};
use crate::validator::{Diagnostic, ValidatorConfig};
use crate::walk::{walk_body, Walk};

/// Accumulates the findings of one walk over a module.
pub struct SecurityScan<'a> {
    config: &'a ValidatorConfig,
    lines: LineIndex,
    pub errors: Vec<Diagnostic>,
    pub imports: BTreeSet<String>,
}

impl<'a> SecurityScan<'a> {
    pub fn new(config: &'a ValidatorConfig, source: &str) -> Self {
        Self {
            config,
            lines: LineIndex::new(source),
            errors: Vec::new(),
            imports: BTreeSet::new(),
        }
    }

    pub fn run(mut self, module: &Module) -> Self {
        walk_body(&mut self, module);
        self
    }

    fn check_import(&mut self, line: usize, path: &str, label: &str) {
        let root = path.split('.').next().unwrap_or(path).to_string();
        if !self.config.allowed_imports.contains(&root) {
            self.errors
                .push(Diagnostic::error(line, format!("{}: {}", label, path)));
        }
        self.imports.insert(root);
    }
}

impl Walk for SecurityScan<'_> {
    fn enter_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Import(import) => {
                let line = self.lines.line(import.range.start());
                for alias in &import.names {
                    self.check_import(line, alias.name.as_str(), "Unauthorized import");
                }
            }
            // `from . import x` names no module to authorize.
            Stmt::ImportFrom(import) => {
                if let Some(module) = &import.module {
                    let line = self.lines.line(import.range.start());
                    self.check_import(line, module.as_str(), "Unauthorized import from");
                }
            }
            _ => {}
        }
    }

    fn enter_expr(&mut self, expr: &Expr) {
        let Expr::Call(call) = expr else {
            return;
        };
        if let CallTarget::Bare { name } = CallTarget::of(&call.func) {
            if self.config.forbidden_calls.contains(&name) {
                let line = self.lines.line(call.range.start());
                self.errors.push(Diagnostic::error(
                    line,
                    format!("Forbidden function call: {}", name),
                ));
            }
        }
    }
}
