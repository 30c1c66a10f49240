// syntax.rs - Parsing generated source into a Python syntax tree.
//
// Parsing is done by rustpython-parser. This module maps its byte offsets
// to 1-based lines, rejects assignment targets that CPython refuses but the
// grammar lets through, and classifies the shape of call targets.

use rustpython_parser::ast::{self, Expr, Stmt};
use rustpython_parser::Parse;
use serde::{Deserialize, Serialize};

use crate::error::SyntaxError;
use crate::walk::{walk_body, Walk};

/// A parsed module body.
pub type Module = ast::Suite;

const SOURCE_PATH: &str = "<generated>";

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub fn line(&self, offset: impl Into<u32>) -> usize {
        let offset = offset.into() as usize;
        self.starts.partition_point(|&start| start <= offset)
    }
}

/// Parse a whole module.
pub fn parse_module(source: &str) -> Result<Module, SyntaxError> {
    let lines = LineIndex::new(source);
    let module = ast::Suite::parse(source, SOURCE_PATH)
        .map_err(|e| SyntaxError::new(lines.line(e.offset), e.error.to_string()))?;

    let mut targets = TargetCheck {
        lines: &lines,
        error: None,
    };
    walk_body(&mut targets, &module);
    match targets.error {
        Some(error) => Err(error),
        None => Ok(module),
    }
}

/// What a call expression calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    /// `name(...)`
    Bare { name: String },
    /// `receiver.attr(...)`. `receiver` is set when it is a plain dotted name.
    Attribute {
        receiver: Option<String>,
        attr: String,
    },
    /// A call of a call, subscript, lambda or other computed value.
    Computed,
}

impl CallTarget {
    pub fn of(func: &Expr) -> Self {
        match func {
            Expr::Name(name) => CallTarget::Bare {
                name: name.id.as_str().to_string(),
            },
            Expr::Attribute(attribute) => CallTarget::Attribute {
                receiver: dotted_name(&attribute.value),
                attr: attribute.attr.as_str().to_string(),
            },
            _ => CallTarget::Computed,
        }
    }

    /// `os.path.join` for attribute calls on dotted names, `eval` for bare ones.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            CallTarget::Bare { name } => Some(name.clone()),
            CallTarget::Attribute {
                receiver: Some(receiver),
                attr,
            } => Some(format!("{}.{}", receiver, attr)),
            _ => None,
        }
    }
}

fn dotted_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(name) => Some(name.id.as_str().to_string()),
        Expr::Attribute(attribute) => dotted_name(&attribute.value)
            .map(|receiver| format!("{}.{}", receiver, attribute.attr.as_str())),
        _ => None,
    }
}

/// Finds the first assignment or deletion whose target is not assignable.
struct TargetCheck<'a> {
    lines: &'a LineIndex,
    error: Option<SyntaxError>,
}

impl TargetCheck<'_> {
    fn check(&mut self, line: usize, target: &Expr, verb: &str) {
        if self.error.is_some() {
            return;
        }
        if let Some(kind) = unassignable(target) {
            self.error = Some(SyntaxError::new(
                line,
                format!("cannot {} {}", verb, kind),
            ));
        }
    }
}

impl Walk for TargetCheck<'_> {
    fn enter_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assign(assign) => {
                let line = self.lines.line(assign.range.start());
                for target in &assign.targets {
                    self.check(line, target, "assign to");
                }
            }
            Stmt::AugAssign(assign) => {
                let line = self.lines.line(assign.range.start());
                self.check(line, &assign.target, "assign to");
            }
            Stmt::AnnAssign(assign) => {
                let line = self.lines.line(assign.range.start());
                self.check(line, &assign.target, "assign to");
            }
            Stmt::Delete(del) => {
                let line = self.lines.line(del.range.start());
                for target in &del.targets {
                    self.check(line, target, "delete");
                }
            }
            _ => {}
        }
    }
}

fn unassignable(target: &Expr) -> Option<&'static str> {
    match target {
        Expr::Name(_) | Expr::Attribute(_) | Expr::Subscript(_) => None,
        Expr::Starred(starred) => unassignable(&starred.value),
        Expr::Tuple(tuple) => tuple.elts.iter().find_map(unassignable),
        Expr::List(list) => list.elts.iter().find_map(unassignable),
        Expr::Call(_) => Some("function call"),
        Expr::Constant(_) => Some("literal"),
        _ => Some("expression"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_call(src: &str) -> CallTarget {
        let module = parse_module(src).unwrap();
        match &module[0] {
            ast::Stmt::Expr(stmt) => match stmt.value.as_ref() {
                Expr::Call(call) => CallTarget::of(&call.func),
                other => panic!("expected call, got {:?}", other),
            },
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn line_index_maps_offsets() {
        let lines = LineIndex::new("a\nbc\n\nd");
        assert_eq!(lines.line(0u32), 1);
        assert_eq!(lines.line(1u32), 1);
        assert_eq!(lines.line(2u32), 2);
        assert_eq!(lines.line(5u32), 3);
        assert_eq!(lines.line(6u32), 4);
    }

    #[test]
    fn call_target_shapes() {
        assert_eq!(
            first_call("eval(x)\n"),
            CallTarget::Bare {
                name: "eval".into()
            }
        );
        let target = first_call("os.path.join(a, b)\n");
        assert_eq!(
            target,
            CallTarget::Attribute {
                receiver: Some("os.path".into()),
                attr: "join".into()
            }
        );
        assert_eq!(target.qualified_name().as_deref(), Some("os.path.join"));
        assert_eq!(first_call("factory()()\n"), CallTarget::Computed);
        assert_eq!(
            first_call("items[0].run()\n"),
            CallTarget::Attribute {
                receiver: None,
                attr: "run".into()
            }
        );
    }

    #[test]
    fn parse_error_cites_its_line() {
        let error = parse_module("import os\n\nif True\n    pass\n").unwrap_err();
        assert_eq!(error.line, 3);
        assert!(error.to_string().starts_with("Syntax error at line 3: "));
    }

    #[test]
    fn unassignable_targets_are_syntax_errors() {
        let error = parse_module("import os\n1 = x\n").unwrap_err();
        assert_eq!(error.line, 2);

        let error = parse_module("import os\nf() = 1\n").unwrap_err();
        assert_eq!(error.line, 2);

        let literal = match &parse_module("1\n").unwrap()[0] {
            ast::Stmt::Expr(stmt) => unassignable(&stmt.value),
            other => panic!("expected expression statement, got {:?}", other),
        };
        assert_eq!(literal, Some("literal"));

        let error = parse_module("def g():\n    a, f() = pair\n").unwrap_err();
        assert_eq!(error.line, 2);

        assert!(parse_module("del f()\n").is_err());
    }

    #[test]
    fn non_default_after_default_parameter_is_rejected() {
        let error = parse_module("import os\ndef f(a=1, b):\n    pass\n").unwrap_err();
        assert_eq!(error.line, 2);
    }

    #[test]
    fn valid_targets_parse() {
        let src = "a = b = 1\nx.y, z[0], *rest = seq\n[p, q] = pair\ncount += 1\nname: str = 'n'\ndel x.y, z[0]\n";
        assert!(parse_module(src).is_ok());
    }

    #[test]
    fn modern_syntax_parses() {
        let src = "\
type Pair[T] = tuple[T, T]\n\
def first[T: int](items: list[T]) -> T:\n    return items[0]\n\
match command:\n    case {'op': op} if (n := len(op)) > 1:\n        pass\n    case _:\n        pass\n\
try:\n    pass\nexcept* ValueError:\n    pass\n\
print(f'{value=}')\n";
        assert!(parse_module(src).is_ok(), "{:?}", parse_module(src).err());
    }

    #[test]
    fn crlf_line_endings_parse() {
        let module = parse_module("import os\r\nx = 1\r\n").unwrap();
        assert_eq!(module.len(), 2);
    }
}
