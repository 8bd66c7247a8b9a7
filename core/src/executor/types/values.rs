//! Runtime value types

use super::super::errors::ErrorInfo;
use super::super::stdlib::NativeFunc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

/// Runtime value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
    /// Host function (require, console.log, assert.equal, ...)
    NativeFunc(NativeFunc),
    /// Error value with code and message
    Error(ErrorInfo),
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Null => false,
            Val::Bool(b) => *b,
            Val::Num(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::List(_) => "list",
            Val::Obj(_) => "object",
            Val::NativeFunc(_) => "function",
            Val::Error(_) => "error",
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Val::Error(ErrorInfo::new(code, message))
    }

    /// Render the value the way console output shows it
    ///
    /// Strings print raw, numbers drop a trailing `.0`, and lists/objects are
    /// rendered as JSON indented by four spaces.
    pub fn display_string(&self) -> String {
        match self {
            Val::Null => "null".to_string(),
            Val::Bool(b) => b.to_string(),
            Val::Num(n) => format_number(*n),
            Val::Str(s) => s.clone(),
            Val::NativeFunc(func) => format!("[function {}]", func.name()),
            Val::Error(info) => info.to_string(),
            Val::List(_) | Val::Obj(_) => pretty_json(&val_to_json(self)),
        }
    }
}

impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Format a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn pretty_json(json: &JsonValue) -> String {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    match json.serialize(&mut ser) {
        Ok(()) => String::from_utf8(out).unwrap_or_default(),
        Err(_) => json.to_string(),
    }
}

/* ===================== JSON Conversion ===================== */

/// Convert a runtime value to plain JSON
///
/// Functions become their name, errors become `{code, message}` objects.
pub fn val_to_json(val: &Val) -> JsonValue {
    match val {
        Val::Null => JsonValue::Null,
        Val::Bool(b) => JsonValue::Bool(*b),
        Val::Num(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                JsonValue::from(*n as i64)
            } else {
                serde_json::Number::from_f64(*n)
                    .map(JsonValue::Number)
                    .unwrap_or(JsonValue::Null)
            }
        }
        Val::Str(s) => JsonValue::String(s.clone()),
        Val::List(items) => JsonValue::Array(items.iter().map(val_to_json).collect()),
        Val::Obj(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), val_to_json(v)))
                .collect(),
        ),
        Val::NativeFunc(func) => JsonValue::String(format!("[function {}]", func.name())),
        Val::Error(info) => {
            let mut obj = serde_json::Map::new();
            obj.insert("code".to_string(), JsonValue::String(info.code.clone()));
            obj.insert("message".to_string(), JsonValue::String(info.message.clone()));
            if let Some(path) = &info.path {
                obj.insert("path".to_string(), JsonValue::String(path.clone()));
            }
            JsonValue::Object(obj)
        }
    }
}

/// Convert plain JSON into a runtime value
pub fn json_to_val(json: &JsonValue) -> Val {
    match json {
        JsonValue::Null => Val::Null,
        JsonValue::Bool(b) => Val::Bool(*b),
        JsonValue::Number(n) => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
        JsonValue::String(s) => Val::Str(s.clone()),
        JsonValue::Array(items) => Val::List(items.iter().map(json_to_val).collect()),
        JsonValue::Object(map) => Val::Obj(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_val(v)))
                .collect(),
        ),
    }
}
