//! Rule: Require Specifier
//!
//! `require` takes exactly one non-empty string. Calls that can never import
//! anything are errors. A specifier computed at run time is a warning, since
//! it cannot be checked before the module runs.
//!
//! # Invalid
//!
//! ```text
//! require()
//! require('./a', './b')
//! require(42)
//! require('')
//! ```
//!
//! # Warned
//!
//! ```text
//! require(name)
//! require('./' + name)
//! ```

use crate::executor::types::ast::{Expr, MemberAccess, Span, Stmt};
use crate::parser::ModuleDef;

use super::super::{Report, Rule};

pub struct RequireSpecifierRule;

impl Rule for RequireSpecifierRule {
    fn id(&self) -> &'static str {
        "require-specifier"
    }

    fn check(&self, module: &ModuleDef, report: &mut Report) {
        check_stmt(&module.body, report, self.id());
    }
}

fn check_stmt(stmt: &Stmt, report: &mut Report, rule: &'static str) {
    match stmt {
        Stmt::Expr { expr, .. } | Stmt::Throw { value: expr, .. } => check_expr(expr, report, rule),
        Stmt::Declare { init, .. } | Stmt::Return { value: init, .. } => {
            if let Some(expr) = init {
                check_expr(expr, report, rule);
            }
        }
        Stmt::Assign { value, path, .. } => {
            check_expr(value, report, rule);
            for segment in path {
                if let MemberAccess::Index { expr, .. } = segment {
                    check_expr(expr, report, rule);
                }
            }
        }
        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            check_expr(test, report, rule);
            check_stmt(then_s, report, rule);
            if let Some(else_s) = else_s {
                check_stmt(else_s, report, rule);
            }
        }
        Stmt::While { test, body, .. } => {
            check_expr(test, report, rule);
            check_stmt(body, report, rule);
        }
        Stmt::ForLoop { iterable, body, .. } => {
            check_expr(iterable, report, rule);
            check_stmt(body, report, rule);
        }
        Stmt::Try {
            body, catch_body, ..
        } => {
            check_stmt(body, report, rule);
            check_stmt(catch_body, report, rule);
        }
        Stmt::Block { body, .. } => {
            for stmt in body {
                check_stmt(stmt, report, rule);
            }
        }
        Stmt::Break { .. } | Stmt::Continue { .. } => {}
    }
}

fn check_expr(expr: &Expr, report: &mut Report, rule: &'static str) {
    match expr {
        Expr::Call { callee, args, span } => {
            if expr.is_require_call() {
                check_specifier(args, *span, report, rule);
            }
            check_expr(callee, report, rule);
            for arg in args {
                check_expr(arg, report, rule);
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            check_expr(left, report, rule);
            check_expr(right, report, rule);
        }
        Expr::Ternary {
            condition,
            consequent,
            alternate,
            ..
        } => {
            check_expr(condition, report, rule);
            check_expr(consequent, report, rule);
            check_expr(alternate, report, rule);
        }
        Expr::Unary { operand, .. } => check_expr(operand, report, rule),
        Expr::Member { object, .. } => check_expr(object, report, rule),
        Expr::Index { object, index, .. } => {
            check_expr(object, report, rule);
            check_expr(index, report, rule);
        }
        Expr::LitList { elements, .. } => {
            for element in elements {
                check_expr(element, report, rule);
            }
        }
        Expr::LitObj { properties, .. } => {
            for (_, _, value) in properties {
                check_expr(value, report, rule);
            }
        }
        Expr::Ident { .. }
        | Expr::LitBool { .. }
        | Expr::LitNum { .. }
        | Expr::LitStr { .. }
        | Expr::LitNull { .. } => {}
    }
}

fn check_specifier(
    args: &[Expr],
    span: Span,
    report: &mut Report,
    rule: &'static str,
) {
    let [specifier] = args else {
        report.error(
            rule,
            span,
            format!("require takes one specifier, got {} arguments", args.len()),
        );
        return;
    };

    match specifier {
        Expr::LitStr { v, .. } if v.is_empty() => {
            report.error(rule, specifier.span(), "empty module specifier");
        }
        Expr::LitStr { .. } => {}
        Expr::LitNum { .. }
        | Expr::LitBool { .. }
        | Expr::LitNull { .. }
        | Expr::LitList { .. }
        | Expr::LitObj { .. } => {
            report.error(rule, specifier.span(), "module specifier must be a string");
        }
        _ => {
            report.warning(
                rule,
                specifier.span(),
                "module specifier is computed at run time and cannot be checked",
            );
        }
    }
}
