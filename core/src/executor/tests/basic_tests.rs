//! Tests for declarations, assignment and expression evaluation

use super::helpers::{eval, num, parse_module_and_build_vm, str, thrown_code, TestHost};
use crate::executor::{errors, run_until_done, Outcome, Val};
use maplit::hashmap;

/* ===================== Completion Values ===================== */

#[test]
fn test_return_value() {
    assert_eq!(eval("return 1 + 2"), num(3.0));
}

#[test]
fn test_bare_return_is_null() {
    assert_eq!(eval("let x = 1\nreturn"), Val::Null);
}

#[test]
fn test_fall_through_uses_last_expression_statement() {
    assert_eq!(eval("let x = 4\nx * 2\nlet y = 0"), num(8.0));
}

#[test]
fn test_empty_module_is_null() {
    assert_eq!(eval(""), Val::Null);
}

#[test]
fn test_return_skips_rest_of_body() {
    let mut vm = parse_module_and_build_vm("return 1\nconsole.log('unreachable')");
    let mut host = TestHost::new();
    run_until_done(&mut vm, &mut host);
    assert_eq!(vm.outcome(), Outcome::Returned(num(1.0)));
    assert!(host.printed.is_empty());
}

/* ===================== Declarations ===================== */

#[test]
fn test_let_without_initializer_is_null() {
    assert_eq!(eval("let x\nreturn x"), Val::Null);
}

#[test]
fn test_destructuring() {
    assert_eq!(
        eval("const {a, b, missing} = {a: 1, b: 'two'}\nreturn [a, b, missing]"),
        Val::List(vec![num(1.0), str("two"), Val::Null])
    );
}

#[test]
fn test_destructuring_non_object() {
    assert_eq!(thrown_code("let {a} = 5"), errors::TYPE_ERROR);
}

#[test]
fn test_const_reassign() {
    assert_eq!(thrown_code("const x = 1\nx = 2"), errors::CONST_REASSIGN);
}

#[test]
fn test_const_contents_are_writable() {
    assert_eq!(eval("const o = {n: 1}\no.n = 2\nreturn o.n"), num(2.0));
}

#[test]
fn test_assign_undeclared() {
    assert_eq!(thrown_code("x = 2"), errors::UNDEFINED_VARIABLE);
}

#[test]
fn test_block_scoping() {
    assert_eq!(eval("let x = 1\n{ let x = 2 }\nreturn x"), num(1.0));
    assert_eq!(thrown_code("{ let inner = 2 }\nreturn inner"), errors::UNDEFINED_VARIABLE);
}

/* ===================== Assignment ===================== */

#[test]
fn test_compound_assignment() {
    assert_eq!(
        eval("let n = 10\nn += 5\nn -= 3\nn *= 2\nn /= 4\nreturn n"),
        num(6.0)
    );
}

#[test]
fn test_string_append() {
    assert_eq!(eval("let s = 'a'\ns += 1\nreturn s"), str("a1"));
}

#[test]
fn test_nested_path_assignment() {
    let result = eval(
        r#"
            let state = {items: [1, 2], meta: {count: 0}}
            state.items[1] = 20
            state.items[2] = 30
            state.meta.count += 3
            state["meta"].label = 'x'
            return state
        "#,
    );
    assert_eq!(
        result,
        Val::Obj(hashmap! {
            "items".to_string() => Val::List(vec![num(1.0), num(20.0), num(30.0)]),
            "meta".to_string() => Val::Obj(hashmap! {
                "count".to_string() => num(3.0),
                "label".to_string() => str("x"),
            }),
        })
    );
}

#[test]
fn test_assignment_past_end_of_list() {
    assert_eq!(
        thrown_code("let xs = [1]\nxs[3] = 4"),
        errors::INDEX_OUT_OF_BOUNDS
    );
}

#[test]
fn test_compound_assignment_to_missing_property() {
    assert_eq!(
        thrown_code("let o = {}\no.count += 1"),
        errors::PROPERTY_NOT_FOUND
    );
}

/* ===================== Expressions ===================== */

#[test]
fn test_arithmetic_precedence() {
    assert_eq!(eval("return 2 + 3 * 4 - 10 / 5"), num(12.0));
    assert_eq!(eval("return (2 + 3) * 4"), num(20.0));
    assert_eq!(eval("return 7 % 4"), num(3.0));
    assert_eq!(eval("return -3 + 1"), num(-2.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("return 'n=' + 4"), str("n=4"));
    assert_eq!(eval("return 1.5 + '!'"), str("1.5!"));
}

#[test]
fn test_structural_equality() {
    assert_eq!(eval("return [1, {a: 2}] == [1, {a: 2}]"), Val::Bool(true));
    assert_eq!(eval("return {a: 1} !== {a: 2}"), Val::Bool(true));
    assert_eq!(eval("return 1 == '1'"), Val::Bool(false));
}

#[test]
fn test_comparisons() {
    assert_eq!(eval("return [1 < 2, 2 <= 2, 'b' > 'a', 3 >= 4]"), Val::List(vec![
        Val::Bool(true),
        Val::Bool(true),
        Val::Bool(true),
        Val::Bool(false),
    ]));
    assert_eq!(thrown_code("return 1 < 'a'"), errors::TYPE_ERROR);
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval("return null && missing"), Val::Null);
    assert_eq!(eval("return 'x' || missing"), str("x"));
    assert_eq!(eval("return 0 || 'fallback'"), str("fallback"));
    assert_eq!(eval("return 0 ?? 'fallback'"), num(0.0));
    assert_eq!(eval("return undefined ?? 'fallback'"), str("fallback"));
    assert_eq!(eval("return !''"), Val::Bool(true));
}

#[test]
fn test_ternary() {
    assert_eq!(eval("let n = 3\nreturn n > 2 ? 'big' : 'small'"), str("big"));
}

#[test]
fn test_member_access() {
    assert_eq!(eval("let o = {a: {b: [10, 20]}}\nreturn o.a.b[1]"), num(20.0));
    assert_eq!(eval("return [1, 2, 3].length + 'abcd'.length"), num(7.0));
    assert_eq!(eval("return 'abc'[1]"), str("b"));
}

#[test]
fn test_optional_access() {
    assert_eq!(eval("let o = null\nreturn o?.a"), Val::Null);
    assert_eq!(eval("let o = {}\nreturn o?.missing"), Val::Null);
    assert_eq!(thrown_code("let o = {}\nreturn o.missing"), errors::PROPERTY_NOT_FOUND);
}

#[test]
fn test_index_errors() {
    assert_eq!(thrown_code("return [1][1]"), errors::INDEX_OUT_OF_BOUNDS);
    assert_eq!(thrown_code("return [1][0.5]"), errors::INDEX_OUT_OF_BOUNDS);
    assert_eq!(thrown_code("return 5[0]"), errors::TYPE_ERROR);
}

#[test]
fn test_calling_non_function() {
    assert_eq!(thrown_code("let f = 1\nf()"), errors::NOT_CALLABLE);
}

#[test]
fn test_undefined_variable() {
    assert_eq!(thrown_code("return nothing"), errors::UNDEFINED_VARIABLE);
}

#[test]
fn test_injected_globals() {
    assert_eq!(
        eval("return [__filename, __dirname, module.exports]"),
        Val::List(vec![str("/test/main"), str("/test"), Val::Bool(false)])
    );
}
