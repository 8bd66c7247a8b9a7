//! Expression evaluation
//!
//! Evaluates expressions to values. Evaluation is strictly left to right and
//! stops at the first `require` whose import has to be deferred; the caller
//! then suspends the VM and re-evaluates the whole statement on resume.
//! Every call that completed during the statement is logged, so on that
//! second pass calls return their logged results and the host sees each
//! call exactly once.

use super::errors::{self, ErrorInfo};
use super::host::{Host, Require};
use super::ops::{binary_op, unary_op};
use super::stdlib::{call_native, NativeFunc};
use super::types::{BinaryOp, Completion, Expr, Val};
use super::env::Env;
use super::vm::Replay;
use std::collections::HashMap;

/* ===================== Evaluation Result ===================== */

/// Result of evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    /// Expression evaluated to a value
    Value { v: Val },
    /// Expression reached a `require` that must complete later
    Suspend { specifier: String },
    /// Expression threw an error
    Throw { error: Val },
}

impl EvalResult {
    pub fn throw(code: &str, message: impl Into<String>) -> Self {
        EvalResult::Throw {
            error: Val::Error(ErrorInfo::new(code, message)),
        }
    }
}

impl From<Result<Val, Val>> for EvalResult {
    fn from(result: Result<Val, Val>) -> Self {
        match result {
            Ok(v) => EvalResult::Value { v },
            Err(error) => EvalResult::Throw { error },
        }
    }
}

/// Unwrap a value or return the suspend/throw from the enclosing evaluator
macro_rules! try_eval {
    ($result:expr) => {
        match $result {
            EvalResult::Value { v } => v,
            other => return other,
        }
    };
}

/* ===================== Evaluator ===================== */

/// Evaluate an expression to a value
pub fn eval_expr(expr: &Expr, env: &Env, replay: &mut Replay, host: &mut dyn Host) -> EvalResult {
    match expr {
        Expr::LitBool { v, .. } => EvalResult::Value { v: Val::Bool(*v) },

        Expr::LitNum { v, .. } => EvalResult::Value { v: Val::Num(*v) },

        Expr::LitStr { v, .. } => EvalResult::Value {
            v: Val::Str(v.clone()),
        },

        Expr::LitNull { .. } => EvalResult::Value { v: Val::Null },

        Expr::LitList { elements, .. } => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                items.push(try_eval!(eval_expr(element, env, replay, host)));
            }
            EvalResult::Value { v: Val::List(items) }
        }

        Expr::LitObj { properties, .. } => {
            let mut map = HashMap::new();
            for (key, _, value) in properties {
                let v = try_eval!(eval_expr(value, env, replay, host));
                map.insert(key.clone(), v);
            }
            EvalResult::Value { v: Val::Obj(map) }
        }

        Expr::Ident { name, .. } => match env.lookup(name) {
            Some(v) => EvalResult::Value { v: v.clone() },
            None => EvalResult::throw(
                errors::UNDEFINED_VARIABLE,
                format!("Undefined variable '{}'", name),
            ),
        },

        Expr::Member {
            object,
            property,
            optional,
            ..
        } => {
            let obj = try_eval!(eval_expr(object, env, replay, host));
            get_property(&obj, property, *optional).into()
        }

        Expr::Index { object, index, .. } => {
            let obj = try_eval!(eval_expr(object, env, replay, host));
            let idx = try_eval!(eval_expr(index, env, replay, host));
            get_index(&obj, &idx).into()
        }

        Expr::Call { callee, args, .. } => {
            let func = try_eval!(eval_expr(callee, env, replay, host));
            let mut arg_vals = Vec::with_capacity(args.len());
            for arg in args {
                arg_vals.push(try_eval!(eval_expr(arg, env, replay, host)));
            }

            if let Some(v) = replay.next() {
                return EvalResult::Value { v };
            }

            let result = match func {
                Val::NativeFunc(NativeFunc::Require) => eval_require(&arg_vals, host),
                Val::NativeFunc(native) => call_native(&native, &arg_vals, host),
                other => EvalResult::throw(
                    errors::NOT_CALLABLE,
                    format!("Value of type {} is not callable", other.type_name()),
                ),
            };
            if let EvalResult::Value { v } = &result {
                replay.record(v.clone());
            }
            result
        }

        Expr::Unary { op, operand, .. } => {
            let v = try_eval!(eval_expr(operand, env, replay, host));
            unary_op(*op, &v).into()
        }

        Expr::BinaryOp {
            op, left, right, ..
        } => {
            let l = try_eval!(eval_expr(left, env, replay, host));
            match op {
                BinaryOp::And if !l.is_truthy() => EvalResult::Value { v: l },
                BinaryOp::Or if l.is_truthy() => EvalResult::Value { v: l },
                BinaryOp::Nullish if l != Val::Null => EvalResult::Value { v: l },
                BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => {
                    eval_expr(right, env, replay, host)
                }
                _ => {
                    let r = try_eval!(eval_expr(right, env, replay, host));
                    binary_op(*op, &l, &r).into()
                }
            }
        }

        Expr::Ternary {
            condition,
            consequent,
            alternate,
            ..
        } => {
            let test = try_eval!(eval_expr(condition, env, replay, host));
            if test.is_truthy() {
                eval_expr(consequent, env, replay, host)
            } else {
                eval_expr(alternate, env, replay, host)
            }
        }
    }
}

/// `require(specifier)`
///
/// The host answers inline for builtins (and for everything under the
/// synchronous loader). A deferred import suspends; its result is logged by
/// `VM::resume` for the next pass.
fn eval_require(args: &[Val], host: &mut dyn Host) -> EvalResult {
    if args.len() != 1 {
        return EvalResult::throw(
            errors::WRONG_ARG_COUNT,
            format!("require expects 1 argument, got {}", args.len()),
        );
    }
    let Val::Str(specifier) = &args[0] else {
        return EvalResult::throw(errors::WRONG_ARG_TYPE, "require expects a string path");
    };

    match host.require(specifier) {
        Require::Ready(Completion::Normal(v)) => EvalResult::Value { v },
        Require::Ready(Completion::Abnormal(error)) => EvalResult::Throw { error },
        Require::Deferred => EvalResult::Suspend {
            specifier: specifier.clone(),
        },
    }
}

/* ===================== Property Access ===================== */

/// Read `obj.property` (or `obj?.property` when `optional`)
pub fn get_property(obj: &Val, property: &str, optional: bool) -> Result<Val, Val> {
    let found = match obj {
        Val::Null if optional => return Ok(Val::Null),
        Val::Obj(map) => map.get(property).cloned(),
        Val::List(items) if property == "length" => Some(Val::Num(items.len() as f64)),
        Val::Str(s) if property == "length" => Some(Val::Num(s.chars().count() as f64)),
        Val::Error(info) => match property {
            "code" => Some(Val::Str(info.code.clone())),
            "message" => Some(Val::Str(info.message.clone())),
            "path" => Some(info.path.clone().map(Val::Str).unwrap_or(Val::Null)),
            _ => None,
        },
        _ => None,
    };

    match found {
        Some(v) => Ok(v),
        None if optional => Ok(Val::Null),
        None => Err(Val::Error(ErrorInfo::new(
            errors::PROPERTY_NOT_FOUND,
            format!("Property '{}' not found on {}", property, obj.type_name()),
        ))),
    }
}

/// Read `obj[index]`
pub fn get_index(obj: &Val, index: &Val) -> Result<Val, Val> {
    match (obj, index) {
        (Val::List(items), Val::Num(n)) => list_index(*n, items.len())
            .map(|i| items[i].clone()),
        (Val::Str(s), Val::Num(n)) => {
            let len = s.chars().count();
            let i = list_index(*n, len)?;
            Ok(s.chars().nth(i).map(|c| Val::Str(c.to_string())).unwrap_or(Val::Null))
        }
        (Val::Obj(_) | Val::Error(_), Val::Str(key)) => get_property(obj, key, false),
        (Val::List(_) | Val::Str(_), Val::Str(key)) => get_property(obj, key, false),
        _ => Err(Val::Error(ErrorInfo::new(
            errors::TYPE_ERROR,
            format!(
                "Cannot index {} with {}",
                obj.type_name(),
                index.type_name()
            ),
        ))),
    }
}

/// Convert a numeric index into a position within `len` items
pub fn list_index(n: f64, len: usize) -> Result<usize, Val> {
    if n.fract() != 0.0 || n < 0.0 || n >= len as f64 {
        return Err(Val::Error(ErrorInfo::new(
            errors::INDEX_OUT_OF_BOUNDS,
            format!("Index {} out of bounds for length {}", n, len),
        )));
    }
    Ok(n as usize)
}
