//! `assert` builtin module
//!
//! Every check returns `null` on success and throws `ASSERTION_FAILED` with
//! either the caller's message (optional last argument) or a generated one.

use super::{expect_args, object, NativeFunc};
use crate::executor::errors;
use crate::executor::expressions::EvalResult;
use crate::executor::types::Val;

pub fn module() -> Val {
    object(&[
        ("ok", NativeFunc::AssertOk),
        ("equal", NativeFunc::AssertEqual),
        ("strictEqual", NativeFunc::AssertStrictEqual),
        ("notEqual", NativeFunc::AssertNotEqual),
        ("notStrictEqual", NativeFunc::AssertNotStrictEqual),
        ("deepEqual", NativeFunc::AssertDeepEqual),
        ("deepStrictEqual", NativeFunc::AssertDeepStrictEqual),
        ("fail", NativeFunc::AssertFail),
    ])
}

fn check(passed: bool, message: Option<&Val>, default: impl FnOnce() -> String) -> EvalResult {
    if passed {
        return EvalResult::Value { v: Val::Null };
    }
    let message = match message {
        Some(Val::Str(s)) => s.clone(),
        Some(other) => other.display_string(),
        None => default(),
    };
    EvalResult::throw(errors::ASSERTION_FAILED, message)
}

/// Equality with the number/string and number/boolean coercions of `==`
fn loose_equal(a: &Val, b: &Val) -> bool {
    fn as_number(v: &Val) -> Option<f64> {
        match v {
            Val::Num(n) => Some(*n),
            Val::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Val::Str(s) if s.trim().is_empty() => Some(0.0),
            Val::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    match (a, b) {
        (Val::Num(_) | Val::Bool(_), Val::Str(_) | Val::Num(_) | Val::Bool(_))
        | (Val::Str(_), Val::Num(_) | Val::Bool(_)) => {
            matches!((as_number(a), as_number(b)), (Some(x), Some(y)) if x == y)
        }
        _ => a == b,
    }
}

/// assert.ok(value, message?)
pub fn ok(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.ok", args, 1, 2) {
        return err;
    }
    check(args[0].is_truthy(), args.get(1), || {
        format!("Expected a truthy value, got {}", args[0])
    })
}

/// assert.equal(actual, expected, message?)
pub fn equal(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.equal", args, 2, 3) {
        return err;
    }
    check(loose_equal(&args[0], &args[1]), args.get(2), || {
        format!("{} == {}", args[0], args[1])
    })
}

/// assert.strictEqual(actual, expected, message?)
pub fn strict_equal(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.strictEqual", args, 2, 3) {
        return err;
    }
    check(args[0] == args[1], args.get(2), || {
        format!("Expected {} to strictly equal {}", args[0], args[1])
    })
}

/// assert.notEqual(actual, expected, message?)
pub fn not_equal(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.notEqual", args, 2, 3) {
        return err;
    }
    check(!loose_equal(&args[0], &args[1]), args.get(2), || {
        format!("{} != {}", args[0], args[1])
    })
}

/// assert.notStrictEqual(actual, expected, message?)
pub fn not_strict_equal(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.notStrictEqual", args, 2, 3) {
        return err;
    }
    check(args[0] != args[1], args.get(2), || {
        format!("Expected {} to not strictly equal {}", args[0], args[1])
    })
}

/// assert.deepEqual / assert.deepStrictEqual(actual, expected, message?)
///
/// Values are compared structurally, so both forms behave the same.
pub fn deep_equal(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.deepEqual", args, 2, 3) {
        return err;
    }
    check(args[0] == args[1], args.get(2), || {
        format!(
            "Expected values to be deeply equal:\n{}\n{}",
            args[0], args[1]
        )
    })
}

/// assert.fail(message?)
pub fn fail(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("assert.fail", args, 0, 1) {
        return err;
    }
    check(false, args.first(), || "Failed".to_string())
}
