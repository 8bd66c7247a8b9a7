//! Console stdlib functions

use crate::executor::expressions::EvalResult;
use crate::executor::host::{ConsoleLevel, Host};
use crate::executor::types::Val;

/// console.log/info/warn/error(...values)
///
/// Arguments are rendered with `Val::display_string` and joined by spaces.
pub fn print(level: ConsoleLevel, args: &[Val], host: &mut dyn Host) -> EvalResult {
    let text = args
        .iter()
        .map(Val::display_string)
        .collect::<Vec<_>>()
        .join(" ");
    host.print(level, text);
    EvalResult::Value { v: Val::Null }
}
