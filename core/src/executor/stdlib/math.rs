//! Math stdlib functions

use super::{expect_args, object, wrong_type, NativeFunc};
use crate::executor::expressions::EvalResult;
use crate::executor::types::Val;

pub fn module() -> Val {
    object(&[
        ("floor", NativeFunc::MathFloor),
        ("ceil", NativeFunc::MathCeil),
        ("abs", NativeFunc::MathAbs),
        ("round", NativeFunc::MathRound),
        ("max", NativeFunc::MathMax),
        ("min", NativeFunc::MathMin),
    ])
}

fn unary(name: &str, args: &[Val], f: fn(f64) -> f64) -> EvalResult {
    if let Err(err) = expect_args(name, args, 1, 1) {
        return err;
    }
    match &args[0] {
        Val::Num(n) => EvalResult::Value { v: Val::Num(f(*n)) },
        other => wrong_type(name, "a number", other),
    }
}

/// Math.floor(x)
pub fn floor(args: &[Val]) -> EvalResult {
    unary("Math.floor", args, f64::floor)
}

/// Math.ceil(x)
pub fn ceil(args: &[Val]) -> EvalResult {
    unary("Math.ceil", args, f64::ceil)
}

/// Math.abs(x)
pub fn abs(args: &[Val]) -> EvalResult {
    unary("Math.abs", args, f64::abs)
}

/// Math.round(x) - halves round up, as in JavaScript
pub fn round(args: &[Val]) -> EvalResult {
    unary("Math.round", args, |n| (n + 0.5).floor())
}

fn fold(name: &str, args: &[Val], init: f64, pick: fn(f64, f64) -> f64) -> EvalResult {
    let mut acc = init;
    for arg in args {
        match arg {
            Val::Num(n) if n.is_nan() => return EvalResult::Value { v: Val::Num(f64::NAN) },
            Val::Num(n) => acc = pick(acc, *n),
            other => return wrong_type(name, "numbers", other),
        }
    }
    EvalResult::Value { v: Val::Num(acc) }
}

/// Math.max(...xs) - `-Infinity` with no arguments
pub fn max(args: &[Val]) -> EvalResult {
    fold("Math.max", args, f64::NEG_INFINITY, f64::max)
}

/// Math.min(...xs) - `Infinity` with no arguments
pub fn min(args: &[Val]) -> EvalResult {
    fold("Math.min", args, f64::INFINITY, f64::min)
}
