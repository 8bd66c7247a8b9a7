//! Rule: Loop Control
//!
//! Reports an error when `break` or `continue` appears outside of a loop.
//!
//! # Invalid
//!
//! ```text
//! if (done) { break }
//! try { continue } catch (e) { }
//! ```

use crate::executor::types::ast::Stmt;
use crate::parser::ModuleDef;

use super::super::{Report, Rule};

pub struct LoopControlRule;

impl Rule for LoopControlRule {
    fn id(&self) -> &'static str {
        "loop-control"
    }

    fn check(&self, module: &ModuleDef, report: &mut Report) {
        check_stmt(&module.body, false, report, self.id());
    }
}

fn check_stmt(stmt: &Stmt, in_loop: bool, report: &mut Report, rule: &'static str) {
    match stmt {
        Stmt::Break { span } if !in_loop => {
            report.error(rule, *span, "'break' outside of a loop");
        }
        Stmt::Continue { span } if !in_loop => {
            report.error(rule, *span, "'continue' outside of a loop");
        }
        Stmt::While { body, .. } | Stmt::ForLoop { body, .. } => {
            check_stmt(body, true, report, rule);
        }
        Stmt::If { then_s, else_s, .. } => {
            check_stmt(then_s, in_loop, report, rule);
            if let Some(else_s) = else_s {
                check_stmt(else_s, in_loop, report, rule);
            }
        }
        Stmt::Try {
            body, catch_body, ..
        } => {
            check_stmt(body, in_loop, report, rule);
            check_stmt(catch_body, in_loop, report, rule);
        }
        Stmt::Block { body, .. } => {
            for stmt in body {
                check_stmt(stmt, in_loop, report, rule);
            }
        }
        _ => {}
    }
}
