//! `immutable` builtin module
//!
//! Values are copied on every call, so the helpers never change a collection
//! that other code still holds. Lists are keyed by number, maps by string.

use super::{expect_args, object, wrong_type, NativeFunc};
use crate::executor::errors;
use crate::executor::expressions::{list_index, EvalResult};
use crate::executor::types::Val;
use std::collections::HashMap;

pub fn module() -> Val {
    object(&[
        ("List", NativeFunc::ImmutableList),
        ("Map", NativeFunc::ImmutableMap),
        ("get", NativeFunc::ImmutableGet),
        ("set", NativeFunc::ImmutableSet),
        ("push", NativeFunc::ImmutablePush),
        ("remove", NativeFunc::ImmutableRemove),
        ("size", NativeFunc::ImmutableSize),
        ("has", NativeFunc::ImmutableHas),
    ])
}

fn value(v: Val) -> EvalResult {
    EvalResult::Value { v }
}

/// immutable.List(list?) - copy of a list, or an empty one
pub fn list(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.List", args, 0, 1) {
        return err;
    }
    match args.first() {
        None => value(Val::List(vec![])),
        Some(Val::List(items)) => value(Val::List(items.clone())),
        Some(other) => wrong_type("immutable.List", "a list", other),
    }
}

/// immutable.Map(object?) - copy of an object, or an empty one
pub fn map(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.Map", args, 0, 1) {
        return err;
    }
    match args.first() {
        None => value(Val::Obj(HashMap::new())),
        Some(Val::Obj(entries)) => value(Val::Obj(entries.clone())),
        Some(other) => wrong_type("immutable.Map", "an object", other),
    }
}

/// immutable.get(collection, key) - `null` when the key is absent
pub fn get(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.get", args, 2, 2) {
        return err;
    }
    match (&args[0], &args[1]) {
        (Val::List(items), Val::Num(n)) => {
            value(list_index(*n, items.len()).map(|i| items[i].clone()).unwrap_or(Val::Null))
        }
        (Val::Obj(entries), Val::Str(key)) => {
            value(entries.get(key).cloned().unwrap_or(Val::Null))
        }
        (collection, _) => key_mismatch("immutable.get", collection),
    }
}

/// immutable.set(collection, key, value) - new collection with the entry replaced
pub fn set(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.set", args, 3, 3) {
        return err;
    }
    match (&args[0], &args[1]) {
        (Val::List(items), Val::Num(n)) => match list_index(*n, items.len() + 1) {
            Ok(i) => {
                let mut items = items.clone();
                if i == items.len() {
                    items.push(args[2].clone());
                } else {
                    items[i] = args[2].clone();
                }
                value(Val::List(items))
            }
            Err(error) => EvalResult::Throw { error },
        },
        (Val::Obj(entries), Val::Str(key)) => {
            let mut entries = entries.clone();
            entries.insert(key.clone(), args[2].clone());
            value(Val::Obj(entries))
        }
        (collection, _) => key_mismatch("immutable.set", collection),
    }
}

/// immutable.push(list, value) - new list with the value appended
pub fn push(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.push", args, 2, 2) {
        return err;
    }
    match &args[0] {
        Val::List(items) => {
            let mut items = items.clone();
            items.push(args[1].clone());
            value(Val::List(items))
        }
        other => wrong_type("immutable.push", "a list", other),
    }
}

/// immutable.remove(collection, key) - new collection without the entry
pub fn remove(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.remove", args, 2, 2) {
        return err;
    }
    match (&args[0], &args[1]) {
        (Val::List(items), Val::Num(n)) => {
            let mut items = items.clone();
            if let Ok(i) = list_index(*n, items.len()) {
                items.remove(i);
            }
            value(Val::List(items))
        }
        (Val::Obj(entries), Val::Str(key)) => {
            let mut entries = entries.clone();
            entries.remove(key);
            value(Val::Obj(entries))
        }
        (collection, _) => key_mismatch("immutable.remove", collection),
    }
}

/// immutable.size(collection)
pub fn size(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.size", args, 1, 1) {
        return err;
    }
    match &args[0] {
        Val::List(items) => value(Val::Num(items.len() as f64)),
        Val::Obj(entries) => value(Val::Num(entries.len() as f64)),
        other => wrong_type("immutable.size", "a list or object", other),
    }
}

/// immutable.has(collection, key)
pub fn has(args: &[Val]) -> EvalResult {
    if let Err(err) = expect_args("immutable.has", args, 2, 2) {
        return err;
    }
    match (&args[0], &args[1]) {
        (Val::List(items), Val::Num(n)) => value(Val::Bool(list_index(*n, items.len()).is_ok())),
        (Val::Obj(entries), Val::Str(key)) => value(Val::Bool(entries.contains_key(key))),
        (collection, _) => key_mismatch("immutable.has", collection),
    }
}

fn key_mismatch(name: &str, collection: &Val) -> EvalResult {
    match collection {
        Val::List(_) => EvalResult::throw(
            errors::WRONG_ARG_TYPE,
            format!("{} expects a number key for a list", name),
        ),
        Val::Obj(_) => EvalResult::throw(
            errors::WRONG_ARG_TYPE,
            format!("{} expects a string key for an object", name),
        ),
        other => wrong_type(name, "a list or object", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    fn ok(result: EvalResult) -> Val {
        match result {
            EvalResult::Value { v } => v,
            other => panic!("expected value, got {:?}", other),
        }
    }

    #[test]
    fn test_push_leaves_original_untouched() {
        let original = Val::List(vec![Val::Num(1.0)]);
        let pushed = ok(push(&[original.clone(), Val::Num(2.0)]));
        assert_eq!(pushed, Val::List(vec![Val::Num(1.0), Val::Num(2.0)]));
        assert_eq!(original, Val::List(vec![Val::Num(1.0)]));
    }

    #[test]
    fn test_map_set_remove() {
        let m = Val::Obj(hashmap! { "a".to_string() => Val::Num(1.0) });
        let m2 = ok(set(&[m.clone(), Val::Str("b".into()), Val::Num(2.0)]));
        assert_eq!(ok(size(&[m2.clone()])), Val::Num(2.0));
        assert_eq!(ok(size(&[m.clone()])), Val::Num(1.0));

        let m3 = ok(remove(&[m2, Val::Str("a".into())]));
        assert_eq!(ok(has(&[m3.clone(), Val::Str("a".into())])), Val::Bool(false));
        assert_eq!(ok(get(&[m3, Val::Str("b".into())])), Val::Num(2.0));
    }

    #[test]
    fn test_get_missing_is_null() {
        let l = ok(list(&[]));
        assert_eq!(ok(get(&[l, Val::Num(3.0)])), Val::Null);
    }

    #[test]
    fn test_wrong_key_type() {
        let EvalResult::Throw { error: Val::Error(err) } =
            get(&[Val::List(vec![]), Val::Str("x".into())])
        else {
            unreachable!("Expected a throw");
        };
        assert_eq!(err.code, errors::WRONG_ARG_TYPE);
    }
}
