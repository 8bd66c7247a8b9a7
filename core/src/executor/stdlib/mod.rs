//! Standard library function implementations
//!
//! This module contains all host functions a unit can call, organized by
//! category, plus the injection of the per-unit globals.

pub mod assert;
pub mod console;
pub mod immutable;
pub mod math;

use super::errors::{self, ErrorInfo};
use super::expressions::EvalResult;
use super::host::{ConsoleLevel, Host};
use super::types::Val;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/* ===================== Native Function Types ===================== */

/// Native function identifiers
///
/// Each variant represents a specific host function.
/// These are serializable and can be stored in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeFunc {
    Require,
    ErrorNew,
    ProcessCwd,
    Console(ConsoleLevel),
    MathFloor,
    MathCeil,
    MathAbs,
    MathRound,
    MathMax,
    MathMin,
    AssertOk,
    AssertEqual,
    AssertStrictEqual,
    AssertNotEqual,
    AssertNotStrictEqual,
    AssertDeepEqual,
    AssertDeepStrictEqual,
    AssertFail,
    ImmutableList,
    ImmutableMap,
    ImmutableGet,
    ImmutableSet,
    ImmutablePush,
    ImmutableRemove,
    ImmutableSize,
    ImmutableHas,
}

impl NativeFunc {
    /// Name as written in guest code
    pub fn name(&self) -> &'static str {
        match self {
            NativeFunc::Require => "require",
            NativeFunc::ErrorNew => "Error",
            NativeFunc::ProcessCwd => "process.cwd",
            NativeFunc::Console(ConsoleLevel::Log) => "console.log",
            NativeFunc::Console(ConsoleLevel::Info) => "console.info",
            NativeFunc::Console(ConsoleLevel::Warn) => "console.warn",
            NativeFunc::Console(ConsoleLevel::Error) => "console.error",
            NativeFunc::MathFloor => "Math.floor",
            NativeFunc::MathCeil => "Math.ceil",
            NativeFunc::MathAbs => "Math.abs",
            NativeFunc::MathRound => "Math.round",
            NativeFunc::MathMax => "Math.max",
            NativeFunc::MathMin => "Math.min",
            NativeFunc::AssertOk => "assert.ok",
            NativeFunc::AssertEqual => "assert.equal",
            NativeFunc::AssertStrictEqual => "assert.strictEqual",
            NativeFunc::AssertNotEqual => "assert.notEqual",
            NativeFunc::AssertNotStrictEqual => "assert.notStrictEqual",
            NativeFunc::AssertDeepEqual => "assert.deepEqual",
            NativeFunc::AssertDeepStrictEqual => "assert.deepStrictEqual",
            NativeFunc::AssertFail => "assert.fail",
            NativeFunc::ImmutableList => "immutable.List",
            NativeFunc::ImmutableMap => "immutable.Map",
            NativeFunc::ImmutableGet => "immutable.get",
            NativeFunc::ImmutableSet => "immutable.set",
            NativeFunc::ImmutablePush => "immutable.push",
            NativeFunc::ImmutableRemove => "immutable.remove",
            NativeFunc::ImmutableSize => "immutable.size",
            NativeFunc::ImmutableHas => "immutable.has",
        }
    }
}

/* ===================== Dispatcher ===================== */

/// Call a native function with arguments
///
/// `require` is not dispatched here; the expression evaluator handles it.
pub fn call_native(func: &NativeFunc, args: &[Val], host: &mut dyn Host) -> EvalResult {
    match func {
        NativeFunc::Require => EvalResult::throw(
            errors::NOT_CALLABLE,
            "require must be called directly",
        ),
        NativeFunc::ErrorNew => error_new(args),
        NativeFunc::ProcessCwd => EvalResult::Value {
            v: Val::Str(host.cwd()),
        },
        NativeFunc::Console(level) => console::print(*level, args, host),
        NativeFunc::MathFloor => math::floor(args),
        NativeFunc::MathCeil => math::ceil(args),
        NativeFunc::MathAbs => math::abs(args),
        NativeFunc::MathRound => math::round(args),
        NativeFunc::MathMax => math::max(args),
        NativeFunc::MathMin => math::min(args),
        NativeFunc::AssertOk => assert::ok(args),
        NativeFunc::AssertEqual => assert::equal(args),
        NativeFunc::AssertStrictEqual => assert::strict_equal(args),
        NativeFunc::AssertNotEqual => assert::not_equal(args),
        NativeFunc::AssertNotStrictEqual => assert::not_strict_equal(args),
        NativeFunc::AssertDeepEqual | NativeFunc::AssertDeepStrictEqual => {
            assert::deep_equal(args)
        }
        NativeFunc::AssertFail => assert::fail(args),
        NativeFunc::ImmutableList => immutable::list(args),
        NativeFunc::ImmutableMap => immutable::map(args),
        NativeFunc::ImmutableGet => immutable::get(args),
        NativeFunc::ImmutableSet => immutable::set(args),
        NativeFunc::ImmutablePush => immutable::push(args),
        NativeFunc::ImmutableRemove => immutable::remove(args),
        NativeFunc::ImmutableSize => immutable::size(args),
        NativeFunc::ImmutableHas => immutable::has(args),
    }
}

/// Error(message) - build an error value guest code can throw
fn error_new(args: &[Val]) -> EvalResult {
    let message = match args.first() {
        Some(Val::Str(s)) => s.clone(),
        Some(other) => other.display_string(),
        None => String::new(),
    };
    EvalResult::Value {
        v: Val::Error(ErrorInfo::new(errors::GUEST_ERROR, message)),
    }
}

/* ===================== Argument Helpers ===================== */

pub(crate) fn expect_args(name: &str, args: &[Val], min: usize, max: usize) -> Result<(), EvalResult> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalResult::throw(
            errors::WRONG_ARG_COUNT,
            format!("{} expects {} arguments, got {}", name, expected, args.len()),
        ));
    }
    Ok(())
}

pub(crate) fn wrong_type(name: &str, expected: &str, got: &Val) -> EvalResult {
    EvalResult::throw(
        errors::WRONG_ARG_TYPE,
        format!("{} expects {}, got {}", name, expected, got.type_name()),
    )
}

fn object(entries: &[(&str, NativeFunc)]) -> Val {
    Val::Obj(
        entries
            .iter()
            .map(|(name, func)| (name.to_string(), Val::NativeFunc(*func)))
            .collect(),
    )
}

/* ===================== Environment Injection ===================== */

/// Build the global scope of a unit loaded from `filename` in `dirname`
///
/// `module.exports` starts as `false`, which the loaders read as "unset".
pub fn inject_globals(filename: &str, dirname: &str) -> HashMap<String, Val> {
    let mut globals = HashMap::new();

    globals.insert("require".to_string(), Val::NativeFunc(NativeFunc::Require));
    globals.insert("Error".to_string(), Val::NativeFunc(NativeFunc::ErrorNew));

    let mut module = HashMap::new();
    module.insert("exports".to_string(), Val::Bool(false));
    globals.insert("module".to_string(), Val::Obj(module));

    globals.insert(
        "console".to_string(),
        object(&[
            ("log", NativeFunc::Console(ConsoleLevel::Log)),
            ("info", NativeFunc::Console(ConsoleLevel::Info)),
            ("warn", NativeFunc::Console(ConsoleLevel::Warn)),
            ("error", NativeFunc::Console(ConsoleLevel::Error)),
        ]),
    );
    globals.insert("Math".to_string(), math::module());
    globals.insert(
        "process".to_string(),
        object(&[("cwd", NativeFunc::ProcessCwd)]),
    );

    globals.insert("__filename".to_string(), Val::Str(filename.to_string()));
    globals.insert("__dirname".to_string(), Val::Str(dirname.to_string()));

    globals
}
