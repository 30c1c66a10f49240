// walk.rs - Source-order walk over a parsed module.
//
// Every statement and expression is entered before its children. Decorators,
// type parameters, defaults, annotations, comprehension clauses, keyword
// arguments, f-string fields and match guards are all reached, so no nesting
// hides a node from a scan.

use rustpython_parser::ast::{self, Expr, Stmt};

/// Callbacks for [`walk_body`]. Both default to doing nothing.
pub trait Walk {
    fn enter_stmt(&mut self, _stmt: &Stmt) {}
    fn enter_expr(&mut self, _expr: &Expr) {}
}

pub fn walk_body<W: Walk + ?Sized>(walker: &mut W, body: &[Stmt]) {
    for stmt in body {
        walk_stmt(walker, stmt);
    }
}

pub fn walk_stmt<W: Walk + ?Sized>(walker: &mut W, stmt: &Stmt) {
    walker.enter_stmt(stmt);
    match stmt {
        Stmt::FunctionDef(def) => {
            walk_exprs(walker, &def.decorator_list);
            walk_type_params(walker, &def.type_params);
            walk_arguments(walker, &def.args);
            walk_opt(walker, &def.returns);
            walk_body(walker, &def.body);
        }
        Stmt::AsyncFunctionDef(def) => {
            walk_exprs(walker, &def.decorator_list);
            walk_type_params(walker, &def.type_params);
            walk_arguments(walker, &def.args);
            walk_opt(walker, &def.returns);
            walk_body(walker, &def.body);
        }
        Stmt::ClassDef(class) => {
            walk_exprs(walker, &class.decorator_list);
            walk_type_params(walker, &class.type_params);
            walk_exprs(walker, &class.bases);
            walk_keywords(walker, &class.keywords);
            walk_body(walker, &class.body);
        }
        Stmt::Return(ret) => walk_opt(walker, &ret.value),
        Stmt::Delete(del) => walk_exprs(walker, &del.targets),
        Stmt::Assign(assign) => {
            walk_exprs(walker, &assign.targets);
            walk_expr(walker, &assign.value);
        }
        Stmt::TypeAlias(alias) => {
            walk_expr(walker, &alias.name);
            walk_type_params(walker, &alias.type_params);
            walk_expr(walker, &alias.value);
        }
        Stmt::AugAssign(assign) => {
            walk_expr(walker, &assign.target);
            walk_expr(walker, &assign.value);
        }
        Stmt::AnnAssign(assign) => {
            walk_expr(walker, &assign.target);
            walk_expr(walker, &assign.annotation);
            walk_opt(walker, &assign.value);
        }
        Stmt::For(stmt) => {
            walk_expr(walker, &stmt.target);
            walk_expr(walker, &stmt.iter);
            walk_body(walker, &stmt.body);
            walk_body(walker, &stmt.orelse);
        }
        Stmt::AsyncFor(stmt) => {
            walk_expr(walker, &stmt.target);
            walk_expr(walker, &stmt.iter);
            walk_body(walker, &stmt.body);
            walk_body(walker, &stmt.orelse);
        }
        Stmt::While(stmt) => {
            walk_expr(walker, &stmt.test);
            walk_body(walker, &stmt.body);
            walk_body(walker, &stmt.orelse);
        }
        Stmt::If(stmt) => {
            walk_expr(walker, &stmt.test);
            walk_body(walker, &stmt.body);
            walk_body(walker, &stmt.orelse);
        }
        Stmt::With(stmt) => {
            walk_with_items(walker, &stmt.items);
            walk_body(walker, &stmt.body);
        }
        Stmt::AsyncWith(stmt) => {
            walk_with_items(walker, &stmt.items);
            walk_body(walker, &stmt.body);
        }
        Stmt::Match(stmt) => {
            walk_expr(walker, &stmt.subject);
            // Patterns hold only names, literals and dotted values.
            for case in &stmt.cases {
                walk_opt(walker, &case.guard);
                walk_body(walker, &case.body);
            }
        }
        Stmt::Raise(raise) => {
            walk_opt(walker, &raise.exc);
            walk_opt(walker, &raise.cause);
        }
        Stmt::Try(stmt) => {
            walk_body(walker, &stmt.body);
            walk_handlers(walker, &stmt.handlers);
            walk_body(walker, &stmt.orelse);
            walk_body(walker, &stmt.finalbody);
        }
        Stmt::TryStar(stmt) => {
            walk_body(walker, &stmt.body);
            walk_handlers(walker, &stmt.handlers);
            walk_body(walker, &stmt.orelse);
            walk_body(walker, &stmt.finalbody);
        }
        Stmt::Assert(assert) => {
            walk_expr(walker, &assert.test);
            walk_opt(walker, &assert.msg);
        }
        Stmt::Expr(stmt) => walk_expr(walker, &stmt.value),
        Stmt::Import(_)
        | Stmt::ImportFrom(_)
        | Stmt::Global(_)
        | Stmt::Nonlocal(_)
        | Stmt::Pass(_)
        | Stmt::Break(_)
        | Stmt::Continue(_) => {}
    }
}

pub fn walk_expr<W: Walk + ?Sized>(walker: &mut W, expr: &Expr) {
    walker.enter_expr(expr);
    match expr {
        Expr::BoolOp(op) => walk_exprs(walker, &op.values),
        Expr::NamedExpr(named) => {
            walk_expr(walker, &named.target);
            walk_expr(walker, &named.value);
        }
        Expr::BinOp(op) => {
            walk_expr(walker, &op.left);
            walk_expr(walker, &op.right);
        }
        Expr::UnaryOp(op) => walk_expr(walker, &op.operand),
        Expr::Lambda(lambda) => {
            walk_arguments(walker, &lambda.args);
            walk_expr(walker, &lambda.body);
        }
        Expr::IfExp(cond) => {
            walk_expr(walker, &cond.test);
            walk_expr(walker, &cond.body);
            walk_expr(walker, &cond.orelse);
        }
        Expr::Dict(dict) => {
            for (key, value) in dict.keys.iter().zip(&dict.values) {
                if let Some(key) = key {
                    walk_expr(walker, key);
                }
                walk_expr(walker, value);
            }
        }
        Expr::Set(set) => walk_exprs(walker, &set.elts),
        Expr::ListComp(comp) => {
            walk_expr(walker, &comp.elt);
            walk_comprehensions(walker, &comp.generators);
        }
        Expr::SetComp(comp) => {
            walk_expr(walker, &comp.elt);
            walk_comprehensions(walker, &comp.generators);
        }
        Expr::DictComp(comp) => {
            walk_expr(walker, &comp.key);
            walk_expr(walker, &comp.value);
            walk_comprehensions(walker, &comp.generators);
        }
        Expr::GeneratorExp(comp) => {
            walk_expr(walker, &comp.elt);
            walk_comprehensions(walker, &comp.generators);
        }
        Expr::Await(await_) => walk_expr(walker, &await_.value),
        Expr::Yield(yield_) => walk_opt(walker, &yield_.value),
        Expr::YieldFrom(yield_) => walk_expr(walker, &yield_.value),
        Expr::Compare(compare) => {
            walk_expr(walker, &compare.left);
            walk_exprs(walker, &compare.comparators);
        }
        Expr::Call(call) => {
            walk_expr(walker, &call.func);
            walk_exprs(walker, &call.args);
            walk_keywords(walker, &call.keywords);
        }
        Expr::FormattedValue(value) => {
            walk_expr(walker, &value.value);
            walk_opt(walker, &value.format_spec);
        }
        Expr::JoinedStr(joined) => walk_exprs(walker, &joined.values),
        Expr::Attribute(attribute) => walk_expr(walker, &attribute.value),
        Expr::Subscript(subscript) => {
            walk_expr(walker, &subscript.value);
            walk_expr(walker, &subscript.slice);
        }
        Expr::Starred(starred) => walk_expr(walker, &starred.value),
        Expr::List(list) => walk_exprs(walker, &list.elts),
        Expr::Tuple(tuple) => walk_exprs(walker, &tuple.elts),
        Expr::Slice(slice) => {
            walk_opt(walker, &slice.lower);
            walk_opt(walker, &slice.upper);
            walk_opt(walker, &slice.step);
        }
        Expr::Name(_) | Expr::Constant(_) => {}
    }
}

fn walk_exprs<W: Walk + ?Sized>(walker: &mut W, exprs: &[Expr]) {
    for expr in exprs {
        walk_expr(walker, expr);
    }
}

fn walk_opt<W: Walk + ?Sized>(walker: &mut W, expr: &Option<Box<Expr>>) {
    if let Some(expr) = expr {
        walk_expr(walker, expr);
    }
}

fn walk_arguments<W: Walk + ?Sized>(walker: &mut W, args: &ast::Arguments) {
    let with_defaults = args
        .posonlyargs
        .iter()
        .chain(&args.args)
        .chain(&args.kwonlyargs);
    for arg in with_defaults {
        walk_opt(walker, &arg.def.annotation);
        walk_opt(walker, &arg.default);
    }
    for arg in args.vararg.iter().chain(&args.kwarg) {
        walk_opt(walker, &arg.annotation);
    }
}

fn walk_keywords<W: Walk + ?Sized>(walker: &mut W, keywords: &[ast::Keyword]) {
    for keyword in keywords {
        walk_expr(walker, &keyword.value);
    }
}

fn walk_comprehensions<W: Walk + ?Sized>(walker: &mut W, generators: &[ast::Comprehension]) {
    for generator in generators {
        walk_expr(walker, &generator.target);
        walk_expr(walker, &generator.iter);
        walk_exprs(walker, &generator.ifs);
    }
}

fn walk_with_items<W: Walk + ?Sized>(walker: &mut W, items: &[ast::WithItem]) {
    for item in items {
        walk_expr(walker, &item.context_expr);
        walk_opt(walker, &item.optional_vars);
    }
}

fn walk_handlers<W: Walk + ?Sized>(walker: &mut W, handlers: &[ast::ExceptHandler]) {
    for handler in handlers {
        let ast::ExceptHandler::ExceptHandler(handler) = handler;
        walk_opt(walker, &handler.type_);
        walk_body(walker, &handler.body);
    }
}

fn walk_type_params<W: Walk + ?Sized>(walker: &mut W, params: &[ast::TypeParam]) {
    for param in params {
        if let ast::TypeParam::TypeVar(var) = param {
            walk_opt(walker, &var.bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_module;

    #[derive(Default)]
    struct Counter {
        stmts: usize,
        names: Vec<String>,
    }

    impl Walk for Counter {
        fn enter_stmt(&mut self, _stmt: &Stmt) {
            self.stmts += 1;
        }

        fn enter_expr(&mut self, expr: &Expr) {
            if let Expr::Name(name) = expr {
                self.names.push(name.id.as_str().to_string());
            }
        }
    }

    fn names(src: &str) -> Vec<String> {
        let module = parse_module(src).unwrap();
        let mut counter = Counter::default();
        walk_body(&mut counter, &module);
        counter.names
    }

    #[test]
    fn statements_are_entered_at_every_depth() {
        let module = parse_module("class A:\n    def f(self):\n        if x:\n            pass\n").unwrap();
        let mut counter = Counter::default();
        walk_body(&mut counter, &module);
        assert_eq!(counter.stmts, 4);
    }

    #[test]
    fn definition_parts_are_walked_in_source_order() {
        assert_eq!(
            names("@deco\ndef f[T: bound](a: ann = default) -> ret:\n    body\n"),
            vec!["deco", "bound", "ann", "default", "ret", "body"]
        );
    }

    #[test]
    fn nested_expression_forms_are_reached() {
        let found = names(
            "x = {k: v for k in ks if cond}\ncall(key=kw)\nwith ctx as c:\n    pass\nmatch s:\n    case 1 if guard:\n        pass\nf'{field:{spec}}'\ntype Alias[U: ubound] = aliased\n",
        );
        for name in ["cond", "kw", "ctx", "guard", "field", "spec", "ubound", "aliased"] {
            assert!(found.iter().any(|n| n == name), "missing {} in {:?}", name, found);
        }
    }
}
