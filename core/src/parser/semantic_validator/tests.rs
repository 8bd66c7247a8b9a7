//! Tests for the static module checks

use super::*;
use crate::parser::parse_module;

// ============================================================================
// Helper Functions
// ============================================================================

fn check(source: &str) -> Report {
    let module = parse_module(source).expect("Parse should succeed");
    check_module(&module)
}

fn rules_of(findings: &[Finding]) -> Vec<&'static str> {
    findings.iter().map(|f| f.rule).collect()
}

// ============================================================================
// Loop Control Tests
// ============================================================================

#[test]
fn test_break_outside_loop() {
    let source = r#"
let x = 1
if (x) { break }
"#;

    let report = check(source);
    assert!(!report.is_loadable());
    assert_eq!(rules_of(&report.errors), vec!["loop-control"]);
    assert!(report.errors[0].message.contains("'break'"));
    assert_eq!(report.errors[0].span.start_line, 2);
}

#[test]
fn test_continue_inside_loop_ok() {
    let source = r#"
for (let x of [1, 2, 3]) {
    if (x == 2) { continue }
    try { break } catch (e) { }
}
while (true) { break }
"#;

    assert_eq!(check(source), Report::default());
}

#[test]
fn test_continue_in_catch_outside_loop() {
    let report = check("try { } catch (e) { continue }");
    assert_eq!(rules_of(&report.errors), vec!["loop-control"]);
}

// ============================================================================
// Require Specifier Tests
// ============================================================================

#[test]
fn test_literal_specifiers_ok() {
    let source = r#"
const total = require("./a") + require("../lib/b")
module.exports = [require("assert"), console.log('x') ?? require("./c")]
"#;

    assert_eq!(check(source), Report::default());
}

#[test]
fn test_wrong_argument_count() {
    let report = check("require()\nlet x = require('./a', './b')");
    assert_eq!(rules_of(&report.errors), vec!["require-specifier", "require-specifier"]);
    assert_eq!(report.errors[1].span.start_line, 1);
    assert!(report.errors[0].message.contains("got 0 arguments"));
}

#[test]
fn test_non_string_and_empty_specifiers() {
    let report = check("require(42)\nrequire(null)\nrequire('')");
    let messages: Vec<_> = report.errors.iter().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "module specifier must be a string",
            "module specifier must be a string",
            "empty module specifier",
        ]
    );
}

#[test]
fn test_computed_specifier_warns() {
    let source = r#"
for (let name of ['./a', './b']) {
    let m = require('./' + name)
}
"#;

    let report = check(source);
    assert!(report.is_loadable());
    assert_eq!(rules_of(&report.warnings), vec!["require-specifier"]);
    assert_eq!(report.warnings[0].span.start_line, 2);
}

#[test]
fn test_nested_require_calls_are_checked() {
    let report = check("let o = {}\no[require(1)] = [require(name)]");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.warnings.len(), 1);
}

// ============================================================================
// Report
// ============================================================================

#[test]
fn test_errors_reported_in_rule_order() {
    let report = check("require(5)\nbreak");
    assert_eq!(
        report.first_error().map(|f| f.rule),
        Some("loop-control")
    );
    assert_eq!(rules_of(&report.errors), vec!["loop-control", "require-specifier"]);
}

#[test]
fn test_display_format() {
    let report = check("break");
    assert_eq!(
        report.errors[0].to_string(),
        "line 1, col 1: 'break' outside of a loop [loop-control]"
    );
}
