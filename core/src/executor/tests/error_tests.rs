//! Tests for guest-visible error values

use super::helpers::{eval, parse_without_validation, run, str, thrown_code, TestHost};
use crate::executor::{errors, run_until_done, Outcome, Val};

/// Error code thrown by a module the loaders would refuse to load
fn unchecked_code(source: &str) -> String {
    let mut vm = parse_without_validation(source);
    run_until_done(&mut vm, &mut TestHost::new());
    match vm.outcome() {
        Outcome::Threw(Val::Error(info)) => info.code,
        other => panic!("Expected an uncaught error, got {:?}", other),
    }
}

#[test]
fn test_error_constructor() {
    assert_eq!(
        eval("let e = Error('bad input')\nreturn [e.code, e.message, e.path]"),
        Val::List(vec![str("Error"), str("bad input"), Val::Null])
    );
}

#[test]
fn test_error_without_message() {
    assert_eq!(eval("return Error().message"), str(""));
}

#[test]
fn test_error_display_in_strings() {
    assert_eq!(eval("return '' + Error('x')"), str("Error: x"));
}

#[test]
fn test_unknown_error_property() {
    assert_eq!(thrown_code("return Error('x').stack"), errors::PROPERTY_NOT_FOUND);
}

#[test]
fn test_require_argument_checks() {
    assert_eq!(unchecked_code("require()"), errors::WRONG_ARG_COUNT);
    assert_eq!(unchecked_code("require('./a', './b')"), errors::WRONG_ARG_COUNT);
    assert_eq!(unchecked_code("require(5)"), errors::WRONG_ARG_TYPE);
    // Past the static check, a computed non-string still fails at run time
    assert_eq!(thrown_code("let n = 5\nrequire(n)"), errors::WRONG_ARG_TYPE);
}

#[test]
fn test_require_through_alias() {
    let (outcome, host) = run("let load = require\nload('./a')");
    assert_eq!(outcome, Outcome::Suspended("./a".to_string()));
    assert_eq!(host.requested, vec!["./a"]);
}

#[test]
fn test_native_argument_errors() {
    assert_eq!(thrown_code("Math.floor()"), errors::WRONG_ARG_COUNT);
    assert_eq!(thrown_code("Math.abs('1')"), errors::WRONG_ARG_TYPE);
}

#[test]
fn test_type_errors() {
    assert_eq!(thrown_code("return [1] - 1"), errors::TYPE_ERROR);
    assert_eq!(thrown_code("return null + 1"), errors::TYPE_ERROR);
    assert_eq!(thrown_code("return -'a'"), errors::TYPE_ERROR);
}

#[test]
fn test_error_raised_after_partial_output() {
    let (outcome, host) = run("console.log('before')\nlet o = null\no.field\nconsole.log('after')");
    assert!(matches!(outcome, Outcome::Threw(Val::Error(ref info)) if info.code == errors::PROPERTY_NOT_FOUND));
    assert_eq!(host.lines(), vec!["before"]);
}
