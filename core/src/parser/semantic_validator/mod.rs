//! Static checks run on a module before it is loaded
//!
//! Every loader checks a module right after parsing it. Errors fail the
//! import the same way a syntax error does (`PARSE_ERROR`); warnings are
//! logged and the module runs anyway. `cadence check` prints both.
//!
//! Rules live one per file in `rules/` and are listed in [`RULES`].

pub mod rules;

use crate::executor::types::ast::Span;
use std::fmt;

use super::ModuleDef;

/// One problem found in a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub span: Span,
    pub message: String,
    /// Id of the rule that produced this finding
    pub rule: &'static str,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, col {}: {} [{}]",
            self.span.start_line + 1,
            self.span.start_col + 1,
            self.message,
            self.rule
        )
    }
}

/// Findings for one module, split by whether they block loading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// The module must not be loaded
    pub errors: Vec<Finding>,
    /// Suspicious but runnable
    pub warnings: Vec<Finding>,
}

impl Report {
    pub fn error(&mut self, rule: &'static str, span: Span, message: impl Into<String>) {
        self.errors.push(Finding {
            span,
            message: message.into(),
            rule,
        });
    }

    pub fn warning(&mut self, rule: &'static str, span: Span, message: impl Into<String>) {
        self.warnings.push(Finding {
            span,
            message: message.into(),
            rule,
        });
    }

    /// Whether the module may be loaded
    pub fn is_loadable(&self) -> bool {
        self.errors.is_empty()
    }

    /// The error that stops the module from loading, if any
    pub fn first_error(&self) -> Option<&Finding> {
        self.errors.first()
    }
}

/// A single static check
pub trait Rule: Sync {
    /// Identifier shown next to each finding, e.g. `loop-control`
    fn id(&self) -> &'static str;

    fn check(&self, module: &ModuleDef, report: &mut Report);
}

/// Every rule, in the order its findings are reported
pub const RULES: &[&dyn Rule] = &[&rules::LoopControlRule, &rules::RequireSpecifierRule];

/// Run every rule against a parsed module
pub fn check_module(module: &ModuleDef) -> Report {
    let mut report = Report::default();
    for rule in RULES {
        rule.check(module, &mut report);
    }
    report
}

#[cfg(test)]
mod tests;
